//! Portfolios: holder sets, holdings and the operation log

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::market::MarketTable;
use crate::{ClientId, Money, PortfolioId, SecurityId, Side};

/// Who owns a portfolio.
///
/// Value, debits and credits are split equally by holder count, never by
/// contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holders {
    Sole(ClientId),
    Shared(Vec<ClientId>),
}

impl Holders {
    pub fn ids(&self) -> &[ClientId] {
        match self {
            Holders::Sole(id) => std::slice::from_ref(id),
            Holders::Shared(ids) => ids,
        }
    }

    pub fn count(&self) -> usize {
        self.ids().len()
    }

    /// More than one holder
    pub fn is_shared(&self) -> bool {
        self.count() > 1
    }
}

impl From<ClientId> for Holders {
    fn from(id: ClientId) -> Self {
        Holders::Sole(id)
    }
}

impl From<Vec<ClientId>> for Holders {
    fn from(ids: Vec<ClientId>) -> Self {
        Holders::Shared(ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub security_id: SecurityId,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Open,
    Close,
    Buy,
    Sell,
}

impl From<Side> for OperationKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => OperationKind::Buy,
            Side::Sell => OperationKind::Sell,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationKind::Open => "OPEN",
            OperationKind::Close => "CLOSE",
            OperationKind::Buy => "BUY",
            OperationKind::Sell => "SELL",
        };
        f.pad(label)
    }
}

/// One entry of a portfolio's append-only operation log.
/// Lifecycle entries (OPEN/CLOSE) carry no security, quantity or value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub date: NaiveDate,
    pub kind: OperationKind,
    pub security_id: Option<SecurityId>,
    pub quantity: Option<u64>,
    pub total_value: Option<Money>,
}

impl OperationRecord {
    pub fn lifecycle(date: NaiveDate, kind: OperationKind) -> Self {
        Self {
            date,
            kind,
            security_id: None,
            quantity: None,
            total_value: None,
        }
    }

    pub fn trade(
        date: NaiveDate,
        side: Side,
        security_id: SecurityId,
        quantity: u64,
        total_value: Money,
    ) -> Self {
        Self {
            date,
            kind: side.into(),
            security_id: Some(security_id),
            quantity: Some(quantity),
            total_value: Some(total_value),
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub holders: Holders,
    pub label: String,
    pub opened_on: NaiveDate,
    pub closed_on: Option<NaiveDate>,
    pub holdings: Vec<Holding>,
    pub operations: Vec<OperationRecord>,
}

impl Portfolio {
    pub fn is_closed(&self) -> bool {
        self.closed_on.is_some()
    }

    pub fn holding(&self, security_id: &SecurityId) -> Option<&Holding> {
        self.holdings.iter().find(|h| &h.security_id == security_id)
    }

    /// Add to an existing holding or append a new one
    pub(crate) fn add_holding(&mut self, security_id: SecurityId, quantity: u64) {
        match self.holdings.iter_mut().find(|h| h.security_id == security_id) {
            Some(holding) => holding.quantity += quantity,
            None => self.holdings.push(Holding {
                security_id,
                quantity,
            }),
        }
    }

    /// Reduce a holding, dropping it once empty
    pub(crate) fn reduce_holding(&mut self, security_id: &SecurityId, quantity: u64) {
        if let Some(holding) = self.holdings.iter_mut().find(|h| &h.security_id == security_id) {
            holding.quantity = holding.quantity.saturating_sub(quantity);
        }
        self.holdings.retain(|h| h.quantity > 0);
    }

    /// Mark-to-market value of all holdings
    pub fn market_value(&self, market: &MarketTable) -> LedgerResult<Money> {
        self.holdings.iter().try_fold(Money::ZERO, |acc, h| {
            let value = market
                .price(&h.security_id)?
                .checked_times(h.quantity)
                .ok_or_else(|| LedgerError::overflow(format!("{} x{}", h.security_id, h.quantity)))?;
            acc.checked_add(value)
                .ok_or_else(|| LedgerError::overflow(format!("value of {}", self.id)))
        })
    }
}

impl Ledger {
    /// Open a portfolio for one or more holders.
    ///
    /// `None` models a missing holder argument and is rejected. Every holder
    /// must be a known client and may appear only once.
    pub fn open_portfolio(
        &mut self,
        holders: Option<Holders>,
        label: impl Into<String>,
    ) -> LedgerResult<PortfolioId> {
        let holders = holders
            .ok_or_else(|| LedgerError::InvalidArgument("holders must be provided".into()))?;

        if holders.count() == 0 {
            return Err(LedgerError::InvalidArgument(
                "shared portfolio needs at least one holder".into(),
            ));
        }
        if !holders.ids().iter().all_unique() {
            return Err(LedgerError::InvalidArgument(format!(
                "duplicate holder in {:?}",
                holders.ids()
            )));
        }
        if let Some(unknown) = holders.ids().iter().find(|id| !self.clients.contains_key(*id)) {
            return Err(LedgerError::not_found(unknown));
        }

        let id = self.allocate_portfolio_id();
        for holder in holders.ids() {
            if let Some(client) = self.clients.get_mut(holder) {
                client.portfolio_ids.insert(id);
            }
        }

        let portfolio = Portfolio {
            id,
            holders,
            label: label.into(),
            opened_on: self.today,
            closed_on: None,
            holdings: Vec::new(),
            operations: vec![OperationRecord::lifecycle(self.today, OperationKind::Open)],
        };
        info!(
            "Opened {} '{}' for {:?}",
            id,
            portfolio.label,
            portfolio.holders.ids()
        );
        self.portfolios.insert(id, portfolio);
        Ok(id)
    }

    /// Liquidate a portfolio at market prices.
    ///
    /// Proceeds are split equally between holders and credited to their
    /// balances, and the portfolio is detached from each holder. The record
    /// stays in the registry (see [`Ledger::discard_portfolio`]).
    pub fn close_portfolio(&mut self, id: PortfolioId) -> LedgerResult<Money> {
        let portfolio = self.portfolio_ref(id)?;
        if portfolio.is_closed() {
            return Err(LedgerError::InvalidState(format!("{} is already closed", id)));
        }
        let proceeds = portfolio.market_value(&self.market)?;
        let holders = portfolio.holders.clone();

        let share = proceeds.share(holders.count());
        let credited = self.credited_balances(holders.ids(), share)?;
        for (holder, balance) in credited {
            if let Some(client) = self.clients.get_mut(&holder) {
                client.balance = balance;
                client.portfolio_ids.remove(&id);
            }
        }

        let today = self.today;
        let portfolio = self.portfolio_mut(id)?;
        portfolio.closed_on = Some(today);
        portfolio
            .operations
            .push(OperationRecord::lifecycle(today, OperationKind::Close));
        info!("Closed {} with proceeds {}", id, proceeds);
        Ok(proceeds)
    }

    /// Remove a closed portfolio record from the registry.
    ///
    /// An open portfolio is still referenced by its holders and must go
    /// through [`Ledger::close_portfolio`] first.
    pub fn discard_portfolio(&mut self, id: PortfolioId) -> LedgerResult<Portfolio> {
        if !self.portfolio_ref(id)?.is_closed() {
            return Err(LedgerError::InvalidState(format!(
                "{} is open; close it before discarding",
                id
            )));
        }
        self.portfolios
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found(id))
    }

    pub fn portfolio(&self, id: PortfolioId) -> Option<&Portfolio> {
        self.portfolios.get(&id)
    }

    pub fn portfolios(&self) -> impl Iterator<Item = &Portfolio> {
        self.portfolios.values()
    }

    /// Mark-to-market value of a portfolio
    pub fn portfolio_value(&self, id: PortfolioId) -> LedgerResult<Money> {
        self.portfolio_ref(id)?.market_value(&self.market)
    }

    pub(crate) fn portfolio_ref(&self, id: PortfolioId) -> LedgerResult<&Portfolio> {
        self.portfolios
            .get(&id)
            .ok_or_else(|| LedgerError::not_found(id))
    }

    pub(crate) fn portfolio_mut(&mut self, id: PortfolioId) -> LedgerResult<&mut Portfolio> {
        self.portfolios
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(id))
    }
}
