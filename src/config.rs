//! Configuration management
//!
//! Handles loading of the JSON configuration that seeds a simulation run:
//! the starting date, limit-price policy, input files and the clients and
//! portfolios that exist before the first order is read.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ledger::{Holders, Ledger, LimitPolicy};
use crate::{ClientId, Money};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub clients: Vec<ClientSeed>,
    #[serde(default)]
    pub portfolios: Vec<PortfolioSeed>,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut config: Config =
            serde_json::from_str(contents).context("Failed to parse config JSON")?;

        if let Ok(market_file) = std::env::var("LEDGER_MARKET_FILE") {
            config.data.market_file = market_file;
        }

        Ok(config)
    }

    /// Starting date, or today's local date when not configured
    pub fn start_date(&self) -> NaiveDate {
        self.ledger
            .start_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Build a ledger with the configured clock, policy, clients and
    /// portfolios. Market and order files are not read here.
    pub fn build_ledger(&self) -> Result<Ledger> {
        let mut ledger =
            Ledger::new(self.start_date()).with_limit_policy(self.ledger.limit_policy);

        for seed in &self.clients {
            let id = ledger.register_client(&seed.tax_id, &seed.name, seed.birth_date);
            if seed.deposit > 0.0 {
                ledger.adjust_balance(id, Money::from_f64(seed.deposit));
            }
        }

        for seed in &self.portfolios {
            let holders = match seed.holders[..] {
                [] => None,
                [only] => Some(Holders::Sole(ClientId(only))),
                _ => Some(Holders::Shared(
                    seed.holders.iter().copied().map(ClientId).collect(),
                )),
            };
            ledger
                .open_portfolio(holders, &seed.label)
                .with_context(|| format!("Failed to open portfolio '{}'", seed.label))?;
        }

        Ok(ledger)
    }
}

/// Ledger behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// First business date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// `ignore` fills orders at market whatever their limit; `enforce` rejects
    /// fills on the wrong side of the limit
    #[serde(default)]
    pub limit_policy: LimitPolicy,
}

/// Input files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub market_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders_file: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            market_file: "data/market.tsv".to_string(),
            orders_file: None,
        }
    }
}

/// Client registered before the run starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSeed {
    pub tax_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    /// Opening cash deposit
    #[serde(default)]
    pub deposit: f64,
}

/// Portfolio opened before the run starts. Holders are client ids in
/// registration order (the first seeded client is 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSeed {
    pub holders: Vec<u64>,
    pub label: String,
}
