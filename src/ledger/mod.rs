//! Brokerage ledger
//!
//! Owns every piece of process state: the market table, the client and
//! portfolio registries, the pending order queue and the current date.
//! All operations are methods on [`Ledger`]; mutations take `&mut self`, so a
//! single writer drives the whole book and each multi-step operation (e.g.
//! the BUY affordability check and the debits that follow it) runs as one
//! uninterrupted call.
//!
//! - [`client`]: registration, closure, balance movements, net worth
//! - [`portfolio`]: holder sets, holdings, operation log, open/close
//! - [`trade`]: buy/sell execution at market price
//! - [`orders`]: order scheduling, cancellation, daily settlement
//! - [`summary`]: read-only portfolio summaries for reporting

pub mod client;
pub mod orders;
pub mod portfolio;
pub mod summary;
pub mod trade;

pub use client::Client;
pub use orders::{LimitPolicy, ScheduledOrder, Settlement};
pub use portfolio::{Holders, Holding, OperationKind, OperationRecord, Portfolio};
pub use summary::{PortfolioSummary, PositionLine};

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::market::{MarketEntry, MarketTable};
use crate::{ClientId, OrderId, PortfolioId};

#[derive(Debug)]
pub struct Ledger {
    today: NaiveDate,
    limit_policy: LimitPolicy,
    market: MarketTable,
    clients: BTreeMap<ClientId, Client>,
    portfolios: BTreeMap<PortfolioId, Portfolio>,
    orders: Vec<ScheduledOrder>,
    next_client_id: u64,
    next_portfolio_id: u64,
    next_order_id: u64,
}

impl Ledger {
    /// Create an empty ledger whose clock starts at `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            limit_policy: LimitPolicy::default(),
            market: MarketTable::new(),
            clients: BTreeMap::new(),
            portfolios: BTreeMap::new(),
            orders: Vec::new(),
            next_client_id: 1,
            next_portfolio_id: 1,
            next_order_id: 1,
        }
    }

    /// Set how limit prices are treated at execution time
    pub fn with_limit_policy(mut self, policy: LimitPolicy) -> Self {
        self.limit_policy = policy;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn limit_policy(&self) -> LimitPolicy {
        self.limit_policy
    }

    pub fn market(&self) -> &MarketTable {
        &self.market
    }

    /// Wholesale-replace the market table
    pub fn replace_market(&mut self, entries: impl IntoIterator<Item = MarketEntry>) {
        self.market.replace_all(entries);
        tracing::debug!("Market table replaced: {} securities", self.market.len());
    }

    fn allocate_client_id(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        id
    }

    fn allocate_portfolio_id(&mut self) -> PortfolioId {
        let id = PortfolioId(self.next_portfolio_id);
        self.next_portfolio_id += 1;
        id
    }

    fn allocate_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::Money;

    pub fn date(s: &str) -> NaiveDate {
        crate::parse_date(s).unwrap()
    }

    /// Ledger dated 2023-11-01 quoting CUR at 5.00 and ACME at 20.00
    pub fn ledger() -> Ledger {
        let mut ledger = Ledger::new(date("2023-11-01"));
        ledger.replace_market(vec![
            MarketEntry::new("CUR", "Curium Holdings", Money::from_f64(5.0)),
            MarketEntry::new("ACME", "Acme Corp", Money::from_f64(20.0)),
        ]);
        ledger
    }

    /// Register a client and deposit `cash`
    pub fn funded_client(ledger: &mut Ledger, name: &str, cash: f64) -> ClientId {
        let id = ledger.register_client("123456789", name, date("1990-01-01"));
        ledger.adjust_balance(id, Money::from_f64(cash));
        id
    }
}
