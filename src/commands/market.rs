//! Market command implementation

use anyhow::{Context, Result};
use brokerage_ledger::{loader, Ledger};
use tracing::info;

pub fn run(file: String) -> Result<()> {
    let mut ledger = Ledger::new(chrono::Local::now().date_naive());
    let count = loader::load_market(&mut ledger, &file)
        .with_context(|| format!("Failed to load market from {}", file))?;
    info!("Loaded {} quotes from {}", count, file);

    println!("{}", "-".repeat(50));
    for entry in ledger.market().sorted() {
        println!(
            "{:<20}{:<8}{:>12.2}",
            entry.display_name,
            entry.security_id.as_str(),
            entry.price.to_f64()
        );
    }
    println!("{}", "-".repeat(50));

    Ok(())
}
