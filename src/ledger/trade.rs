//! Trade execution at the quoted market price
//!
//! A BUY debits every holder its equal share of the cost, but only after
//! checking that all of them can afford it. A SELL is clamped to the held
//! quantity and credits the proceeds in equal shares. Either the whole
//! mutation set commits or nothing changes.

use tracing::{debug, info};

use super::portfolio::OperationRecord;
use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::{ClientId, Money, PortfolioId, SecurityId, Side};

impl Ledger {
    /// Buy or sell `quantity` units of a security for a portfolio.
    ///
    /// Returns the realized total value of the trade.
    pub fn execute_operation(
        &mut self,
        portfolio_id: PortfolioId,
        side: Side,
        security_id: impl Into<SecurityId>,
        quantity: u64,
    ) -> LedgerResult<Money> {
        let security_id = security_id.into();
        if quantity == 0 {
            return Err(LedgerError::InvalidArgument(format!(
                "{} of zero {} units",
                side, security_id
            )));
        }

        let portfolio = self.portfolio_ref(portfolio_id)?;
        if portfolio.is_closed() {
            return Err(LedgerError::InvalidState(format!(
                "{} is closed",
                portfolio_id
            )));
        }
        let holders: Vec<ClientId> = portfolio.holders.ids().to_vec();

        match side {
            Side::Buy => self.buy(portfolio_id, &holders, security_id, quantity),
            Side::Sell => {
                let held = portfolio
                    .holding(&security_id)
                    .map(|h| h.quantity)
                    .ok_or_else(|| {
                        LedgerError::not_found(format!("{} in {}", security_id, portfolio_id))
                    })?;
                self.sell(portfolio_id, &holders, security_id, quantity.min(held))
            }
        }
    }

    fn buy(
        &mut self,
        portfolio_id: PortfolioId,
        holders: &[ClientId],
        security_id: SecurityId,
        quantity: u64,
    ) -> LedgerResult<Money> {
        let price = self.market.price(&security_id)?;
        let total = trade_total(price, &security_id, quantity)?;
        let share = total.share(holders.len());

        for holder in holders {
            let available = self
                .clients
                .get(holder)
                .map(|c| c.balance)
                .ok_or_else(|| LedgerError::not_found(holder))?;
            if available < share {
                debug!(
                    "{} cannot cover {} of {} x{}",
                    holder, share, security_id, quantity
                );
                return Err(LedgerError::InsufficientFunds {
                    client: *holder,
                    required: share,
                    available,
                });
            }
        }

        for holder in holders {
            if let Some(client) = self.clients.get_mut(holder) {
                client.balance -= share;
            }
        }

        let today = self.today;
        let portfolio = self.portfolio_mut(portfolio_id)?;
        portfolio.add_holding(security_id.clone(), quantity);
        portfolio.operations.push(OperationRecord::trade(
            today,
            Side::Buy,
            security_id.clone(),
            quantity,
            total,
        ));

        info!(
            "{} BUY {} x{} @ {} = {}",
            portfolio_id, security_id, quantity, price, total
        );
        Ok(total)
    }

    fn sell(
        &mut self,
        portfolio_id: PortfolioId,
        holders: &[ClientId],
        security_id: SecurityId,
        quantity: u64,
    ) -> LedgerResult<Money> {
        let price = self.market.price(&security_id)?;
        let total = trade_total(price, &security_id, quantity)?;
        let share = total.share(holders.len());

        for (holder, balance) in self.credited_balances(holders, share)? {
            if let Some(client) = self.clients.get_mut(&holder) {
                client.balance = balance;
            }
        }

        let today = self.today;
        let portfolio = self.portfolio_mut(portfolio_id)?;
        portfolio.reduce_holding(&security_id, quantity);
        portfolio.operations.push(OperationRecord::trade(
            today,
            Side::Sell,
            security_id.clone(),
            quantity,
            total,
        ));

        info!(
            "{} SELL {} x{} @ {} = {}",
            portfolio_id, security_id, quantity, price, total
        );
        Ok(total)
    }
}

fn trade_total(price: Money, security_id: &SecurityId, quantity: u64) -> LedgerResult<Money> {
    price
        .checked_times(quantity)
        .ok_or_else(|| LedgerError::overflow(format!("{} x{} @ {}", security_id, quantity, price)))
}
