//! Client lifecycle and cash accounting

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::{ClientId, Money, PortfolioId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub tax_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub balance: Money,
    /// Every portfolio (sole or shared) this client is a holder of
    pub portfolio_ids: BTreeSet<PortfolioId>,
}

impl Ledger {
    pub fn register_client(
        &mut self,
        tax_id: impl Into<String>,
        name: impl Into<String>,
        birth_date: NaiveDate,
    ) -> ClientId {
        let id = self.allocate_client_id();
        let client = Client {
            id,
            tax_id: tax_id.into(),
            name: name.into(),
            birth_date,
            balance: Money::ZERO,
            portfolio_ids: BTreeSet::new(),
        };
        info!("Registered {} ({})", id, client.name);
        self.clients.insert(id, client);
        id
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Cash balance, zero for unknown clients
    pub fn balance(&self, id: ClientId) -> Money {
        self.clients.get(&id).map(|c| c.balance).unwrap_or(Money::ZERO)
    }

    /// Deposit (positive) or withdraw (negative) cash.
    ///
    /// A withdrawal larger than the balance drains it to zero. Returns the
    /// signed amount actually moved; unknown clients move nothing, and
    /// neither does a deposit the balance cannot represent.
    pub fn adjust_balance(&mut self, id: ClientId, amount: Money) -> Money {
        let Some(client) = self.clients.get_mut(&id) else {
            return Money::ZERO;
        };

        let moved = if amount.is_negative() && client.balance < amount.abs() {
            -client.balance
        } else {
            amount
        };
        let Some(balance) = client.balance.checked_add(moved) else {
            warn!("{} deposit of {} is out of range", id, amount);
            return Money::ZERO;
        };
        client.balance = balance;
        debug!("{} balance moved by {} -> {}", id, moved, client.balance);
        moved
    }

    /// Balances after crediting `amount` to every holder, computed before
    /// anything moves so a credit that overflows changes nothing.
    pub(crate) fn credited_balances(
        &self,
        holders: &[ClientId],
        amount: Money,
    ) -> LedgerResult<Vec<(ClientId, Money)>> {
        holders
            .iter()
            .filter_map(|holder| self.clients.get(holder).map(|c| (*holder, c.balance)))
            .map(|(holder, balance)| {
                balance
                    .checked_add(amount)
                    .map(|b| (holder, b))
                    .ok_or_else(|| LedgerError::overflow(format!("balance of {}", holder)))
            })
            .collect()
    }

    /// Close a client, liquidating every portfolio it holds alone.
    ///
    /// Returns the payout (cash balance plus liquidation proceeds), or zero
    /// for an unknown client. Fails without touching anything if the client
    /// holds a shared portfolio or a holding has no market quote. Closed
    /// portfolio records naming the client are discarded with it.
    pub fn close_client(&mut self, id: ClientId) -> LedgerResult<Money> {
        let Some(client) = self.clients.get(&id) else {
            return Ok(Money::ZERO);
        };

        let portfolio_ids: Vec<PortfolioId> = client.portfolio_ids.iter().copied().collect();
        let mut expected = client.balance;
        for pid in &portfolio_ids {
            let portfolio = self.portfolio_ref(*pid)?;
            if portfolio.holders.is_shared() {
                return Err(LedgerError::InvalidState(format!(
                    "{} holds shared {}; exit it first",
                    id, pid
                )));
            }
            // Fail before any liquidation if a holding cannot be priced
            expected = expected
                .checked_add(portfolio.market_value(&self.market)?)
                .ok_or_else(|| LedgerError::overflow(format!("payout of {}", id)))?;
        }
        debug!("{} liquidation pays out {}", id, expected);

        // Sole holder: close_portfolio credits the full proceeds to the balance
        for pid in portfolio_ids {
            self.close_portfolio(pid)?;
            self.portfolios.remove(&pid);
        }
        self.portfolios
            .retain(|_, p| !(p.is_closed() && p.holders.ids().contains(&id)));

        let payout = self
            .clients
            .remove(&id)
            .map(|c| c.balance)
            .unwrap_or(Money::ZERO);
        info!("Closed {} with payout {}", id, payout);
        Ok(payout)
    }

    /// Cash plus this client's share of every portfolio it holds, at current
    /// market prices. Zero for unknown clients.
    pub fn net_worth(&self, id: ClientId) -> LedgerResult<Money> {
        let Some(client) = self.clients.get(&id) else {
            return Ok(Money::ZERO);
        };

        let mut total = client.balance;
        for pid in &client.portfolio_ids {
            let portfolio = self.portfolio_ref(*pid)?;
            let share = portfolio
                .market_value(&self.market)?
                .share(portfolio.holders.count());
            total = total
                .checked_add(share)
                .ok_or_else(|| LedgerError::overflow(format!("net worth of {}", id)))?;
        }
        Ok(total)
    }
}
