//! Order scheduling and daily settlement
//!
//! An order dated today (or undated) executes immediately; a future-dated
//! order waits in the queue as PENDING until the clock reaches its date,
//! where it gets exactly one execution attempt and leaves the queue either
//! EXECUTED or REJECTED. Past-dated orders are refused up front.
//!
//! ```text
//! schedule_order ──► PENDING ──advance_day──► EXECUTED | REJECTED
//!                       │
//!                       └──cancel_order──► (removed)
//! ```

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::{Money, OrderId, PortfolioId, SecurityId, Side};

/// How an order's limit price is treated at execution time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPolicy {
    /// Orders fill at the market price whatever their limit
    #[default]
    Ignore,
    /// Buy only when price <= limit, sell only when price >= limit
    Enforce,
}

impl LimitPolicy {
    pub fn permits(self, side: Side, price: Money, limit: Money) -> bool {
        match (self, side) {
            (LimitPolicy::Ignore, _) => true,
            (LimitPolicy::Enforce, Side::Buy) => price <= limit,
            (LimitPolicy::Enforce, Side::Sell) => price >= limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOrder {
    pub id: OrderId,
    pub portfolio_id: PortfolioId,
    pub side: Side,
    pub security_id: SecurityId,
    pub quantity: u64,
    pub limit_price: Money,
    pub scheduled_for: NaiveDate,
}

/// Outcome of one settlement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub date: NaiveDate,
    pub executed: usize,
    pub rejected: usize,
}

impl Ledger {
    /// Execute now or queue for a later date.
    ///
    /// Returns whether the order executed (same day) or was queued (future
    /// date). Same-day failures and past dates return `false`; errors are
    /// logged, never propagated.
    pub fn schedule_order(
        &mut self,
        portfolio_id: PortfolioId,
        side: Side,
        security_id: impl Into<SecurityId>,
        quantity: u64,
        limit_price: Money,
        date: Option<NaiveDate>,
    ) -> bool {
        let security_id = security_id.into();
        if quantity == 0 {
            warn!("Refused zero-quantity {} {} for {}", side, security_id, portfolio_id);
            return false;
        }

        match date {
            None => {}
            Some(d) if d == self.today => {}
            Some(d) if d < self.today => {
                debug!(
                    "Refused {} {} for {}: {} is before {}",
                    side, security_id, portfolio_id, d, self.today
                );
                return false;
            }
            Some(d) => {
                let id = self.allocate_order_id();
                info!(
                    "Queued {} {} {} x{} for {} on {}",
                    id, side, security_id, quantity, portfolio_id, d
                );
                self.orders.push(ScheduledOrder {
                    id,
                    portfolio_id,
                    side,
                    security_id,
                    quantity,
                    limit_price,
                    scheduled_for: d,
                });
                return true;
            }
        }

        match self.fill(portfolio_id, side, &security_id, quantity, limit_price) {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Same-day {} {} x{} for {} failed: {}",
                    side, security_id, quantity, portfolio_id, e
                );
                false
            }
        }
    }

    /// Remove a pending order before it settles
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != id);
        let cancelled = self.orders.len() < before;
        if cancelled {
            info!("Cancelled {}", id);
        }
        cancelled
    }

    pub fn pending_orders(&self) -> &[ScheduledOrder] {
        &self.orders
    }

    /// Move the clock and settle every order due on the new date.
    ///
    /// With `Some(date)` the clock is set to that date as given (it may move
    /// backwards); otherwise it advances by one day. Orders dated for the new
    /// day are attempted once and dropped from the queue whatever the
    /// outcome.
    pub fn advance_day(&mut self, date: Option<NaiveDate>) -> Settlement {
        self.today = match date {
            Some(d) => d,
            None => self
                .today
                .checked_add_days(Days::new(1))
                .unwrap_or(self.today),
        };
        let today = self.today;

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.orders)
            .into_iter()
            .partition(|o| o.scheduled_for == today);
        self.orders = waiting;

        let mut settlement = Settlement {
            date: today,
            executed: 0,
            rejected: 0,
        };
        for order in due {
            match self.fill(
                order.portfolio_id,
                order.side,
                &order.security_id,
                order.quantity,
                order.limit_price,
            ) {
                Ok(_) => settlement.executed += 1,
                Err(e) => {
                    warn!("Rejected {} on {}: {}", order.id, today, e);
                    settlement.rejected += 1;
                }
            }
        }

        info!(
            "Day {}: {} executed, {} rejected, {} pending",
            today,
            settlement.executed,
            settlement.rejected,
            self.orders.len()
        );
        settlement
    }

    /// Execute an order, applying the limit policy first
    fn fill(
        &mut self,
        portfolio_id: PortfolioId,
        side: Side,
        security_id: &SecurityId,
        quantity: u64,
        limit_price: Money,
    ) -> LedgerResult<Money> {
        let price = self.market.price(security_id)?;
        if !self.limit_policy.permits(side, price, limit_price) {
            return Err(LedgerError::InvalidState(format!(
                "{} {} at {} violates limit {}",
                side, security_id, price, limit_price
            )));
        }
        self.execute_operation(portfolio_id, side, security_id.clone(), quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn setup() -> (Ledger, PortfolioId) {
        let mut ledger = ledger();
        let a = funded_client(&mut ledger, "Jane Doe", 100.0);
        let pid = ledger.open_portfolio(Some(a.into()), "Carteira 2").unwrap();
        (ledger, pid)
    }

    #[test]
    fn test_future_order_is_queued() {
        let (mut ledger, pid) = setup();
        let ok = ledger.schedule_order(
            pid,
            Side::Buy,
            "CUR",
            5,
            Money::from_f64(100.0),
            Some(date("2023-11-11")),
        );
        assert!(ok);
        let pending = ledger.pending_orders();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].portfolio_id, pid);
        assert_eq!(pending[0].side, Side::Buy);
        assert_eq!(pending[0].quantity, 5);
        assert_eq!(pending[0].limit_price, Money::from_f64(100.0));
        assert_eq!(pending[0].scheduled_for, date("2023-11-11"));
    }

    #[test]
    fn test_past_order_is_refused() {
        let (mut ledger, pid) = setup();
        let ok = ledger.schedule_order(
            pid,
            Side::Buy,
            "CUR",
            5,
            Money::from_f64(5.0),
            Some(date("2023-10-31")),
        );
        assert!(!ok);
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_same_day_order_executes_immediately() {
        let (mut ledger, pid) = setup();
        let today = Some(ledger.today());

        assert!(ledger.schedule_order(pid, Side::Buy, "CUR", 4, Money::from_f64(5.0), today));
        assert!(ledger.pending_orders().is_empty());
        assert_eq!(ledger.portfolio(pid).unwrap().holdings[0].quantity, 4);

        // Undated behaves like today
        assert!(ledger.schedule_order(pid, Side::Buy, "CUR", 1, Money::from_f64(5.0), None));
        assert_eq!(ledger.portfolio(pid).unwrap().holdings[0].quantity, 5);

        // Failure is reported as false, never queued
        assert!(!ledger.schedule_order(pid, Side::Buy, "ACME", 100, Money::from_f64(20.0), today));
        assert!(!ledger.schedule_order(pid, Side::Sell, "ACME", 1, Money::ZERO, None));
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_zero_quantity_is_refused() {
        let (mut ledger, pid) = setup();
        assert!(!ledger.schedule_order(
            pid,
            Side::Sell,
            "CUR",
            0,
            Money::ZERO,
            Some(date("2023-11-05"))
        ));
        assert!(ledger.pending_orders().is_empty());
    }

    #[test]
    fn test_advance_day_settles_only_due_orders() {
        let (mut ledger, pid) = setup();
        let limit = Money::from_f64(5.0);
        ledger.schedule_order(pid, Side::Buy, "CUR", 2, limit, Some(date("2023-11-02")));
        ledger.schedule_order(pid, Side::Buy, "CUR", 3, limit, Some(date("2023-11-03")));
        ledger.schedule_order(pid, Side::Buy, "ACME", 50, limit, Some(date("2023-11-02")));

        let settlement = ledger.advance_day(None);
        assert_eq!(ledger.today(), date("2023-11-02"));
        assert_eq!(settlement.executed, 1);
        assert_eq!(settlement.rejected, 1);

        let pending = ledger.pending_orders();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].scheduled_for, date("2023-11-03"));
        assert_eq!(ledger.portfolio(pid).unwrap().holdings[0].quantity, 2);

        ledger.advance_day(None);
        assert!(ledger.pending_orders().is_empty());
        assert_eq!(ledger.portfolio(pid).unwrap().holdings[0].quantity, 5);
    }

    #[test]
    fn test_explicit_date_jump_only_settles_exact_matches() {
        let (mut ledger, pid) = setup();
        let limit = Money::from_f64(5.0);
        ledger.schedule_order(pid, Side::Buy, "CUR", 1, limit, Some(date("2023-11-05")));
        ledger.schedule_order(pid, Side::Buy, "CUR", 1, limit, Some(date("2023-11-20")));

        // Skipping past an order's date does not settle it
        let settlement = ledger.advance_day(Some(date("2023-11-10")));
        assert_eq!(settlement.executed + settlement.rejected, 0);
        assert_eq!(ledger.pending_orders().len(), 2);

        // Explicit dates may move the clock backwards
        ledger.advance_day(Some(date("2023-11-05")));
        assert_eq!(ledger.today(), date("2023-11-05"));
        assert_eq!(ledger.pending_orders().len(), 1);
    }

    #[test]
    fn test_cancel_pending_order() {
        let (mut ledger, pid) = setup();
        ledger.schedule_order(pid, Side::Buy, "CUR", 1, Money::ZERO, Some(date("2023-11-02")));
        let id = ledger.pending_orders()[0].id;

        assert!(ledger.cancel_order(id));
        assert!(!ledger.cancel_order(id));
        assert_eq!(ledger.advance_day(None).executed, 0);
        assert!(ledger.portfolio(pid).unwrap().holdings.is_empty());
    }

    #[test]
    fn test_limit_policy() {
        let price = Money::from_f64(5.0);
        assert!(LimitPolicy::Ignore.permits(Side::Buy, price, Money::ZERO));
        assert!(LimitPolicy::Enforce.permits(Side::Buy, price, Money::from_f64(5.0)));
        assert!(!LimitPolicy::Enforce.permits(Side::Buy, price, Money::from_f64(4.99)));
        assert!(LimitPolicy::Enforce.permits(Side::Sell, price, Money::from_f64(4.0)));
        assert!(!LimitPolicy::Enforce.permits(Side::Sell, price, Money::from_f64(6.0)));
    }

    #[test]
    fn test_enforced_limit_rejects_at_settlement() {
        let mut ledger = ledger().with_limit_policy(LimitPolicy::Enforce);
        let a = funded_client(&mut ledger, "A", 100.0);
        let pid = ledger.open_portfolio(Some(a.into()), "Main").unwrap();

        ledger.schedule_order(pid, Side::Buy, "CUR", 1, Money::from_f64(4.0), Some(date("2023-11-02")));
        let settlement = ledger.advance_day(None);
        assert_eq!(settlement.rejected, 1);
        assert!(ledger.pending_orders().is_empty());
        assert_eq!(ledger.balance(a), Money::from_f64(100.0));
    }
}
