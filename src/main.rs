//! Brokerage ledger - main entry point
//!
//! This binary provides two subcommands:
//! - simulate: Seed a ledger from config, load market and orders, advance the clock
//! - market: Load and print a market file

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "brokerage-ledger")]
#[command(about = "Brokerage back-office ledger with date-driven order settlement", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a settlement simulation
    Simulate {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/ledger.json")]
        config: String,

        /// Number of business days to advance
        #[arg(short, long, default_value = "0")]
        days: u32,

        /// Advance day by day until this date (YYYY-MM-DD); overrides --days
        #[arg(long)]
        until: Option<String>,
    },

    /// Print the quotes in a market file
    Market {
        /// Tab-separated market file
        #[arg(short, long, default_value = "data/market.tsv")]
        file: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Reports go to stdout, so the console layer writes to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Simulate { .. } => "simulate",
        Commands::Market { .. } => "market",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Simulate {
            config,
            days,
            until,
        } => commands::simulate::run(config, days, until),

        Commands::Market { file } => commands::market::run(file),
    }
}
