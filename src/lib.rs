//! Brokerage Ledger
//!
//! A simplified brokerage back-office: clients with cash balances, sole and
//! shared securities portfolios, a market price table, and a deferred order
//! book settled as the business date advances.

pub mod config;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod market;
pub mod report;
pub mod types;

pub use config::Config;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{
    Client, Holders, Holding, Ledger, LimitPolicy, OperationKind, OperationRecord, Portfolio,
    PortfolioSummary, PositionLine, ScheduledOrder, Settlement,
};
pub use market::{MarketEntry, MarketTable};
pub use types::*;
