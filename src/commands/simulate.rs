//! Simulate command implementation

use anyhow::{Context, Result};
use brokerage_ledger::report::render_summary;
use brokerage_ledger::{loader, parse_date, Config};
use tracing::{debug, info};

pub fn run(config_path: String, days: u32, until: Option<String>) -> Result<()> {
    info!("Starting simulation");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let mut ledger = config.build_ledger()?;
    info!(
        "Ledger opened on {} with {} clients and {} portfolios (limit policy: {:?})",
        ledger.today(),
        ledger.clients().count(),
        ledger.portfolios().count(),
        ledger.limit_policy()
    );

    let quotes = loader::load_market(&mut ledger, &config.data.market_file)
        .with_context(|| format!("Failed to load market from {}", config.data.market_file))?;
    debug!("{} quotes available", quotes);

    if let Some(orders_file) = &config.data.orders_file {
        let batch = loader::load_orders(&mut ledger, orders_file)
            .with_context(|| format!("Failed to load orders from {}", orders_file))?;
        info!(
            "Orders: {} accepted, {} refused, {} skipped",
            batch.accepted, batch.refused, batch.skipped
        );
    }

    let target = match until {
        Some(s) => {
            let date = parse_date(&s).with_context(|| format!("Invalid --until date: {}", s))?;
            anyhow::ensure!(
                date >= ledger.today(),
                "--until {} is before the start date {}",
                date,
                ledger.today()
            );
            date
        }
        None => ledger
            .today()
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .context("Date overflow")?,
    };

    let (mut executed, mut rejected) = (0, 0);
    while ledger.today() < target {
        let settlement = ledger.advance_day(None);
        executed += settlement.executed;
        rejected += settlement.rejected;
    }
    info!(
        "Advanced to {}: {} orders executed, {} rejected, {} still pending",
        ledger.today(),
        executed,
        rejected,
        ledger.pending_orders().len()
    );

    for portfolio in ledger.portfolios().filter(|p| !p.is_closed()) {
        let summary = ledger.summarize_portfolio(portfolio.id, None, None)?;
        println!("{}", render_summary(&summary));
    }

    println!("{}", "=".repeat(50));
    println!("CLIENT POSITIONS ({})", ledger.today());
    println!("{}", "=".repeat(50));
    for client in ledger.clients() {
        let worth = ledger.net_worth(client.id)?;
        println!(
            "{:<30}{:>8.2}{:>12.2}",
            client.name,
            client.balance.to_f64(),
            worth.to_f64()
        );
    }
    println!("{}", "=".repeat(50));

    info!("Simulation completed successfully");

    Ok(())
}
