//! Portfolio summaries
//!
//! Read-only assembly of what a report shows: current positions valued at
//! market and the operations inside a date window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::portfolio::OperationRecord;
use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::{Money, PortfolioId, SecurityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionLine {
    pub display_name: String,
    pub security_id: SecurityId,
    pub quantity: u64,
    pub market_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub portfolio_id: PortfolioId,
    pub label: String,
    pub as_of: NaiveDate,
    pub positions: Vec<PositionLine>,
    pub total_value: Money,
    pub operations: Vec<OperationRecord>,
}

impl Ledger {
    /// Summarize a portfolio.
    ///
    /// `from` defaults to the opening date and `to` to today; both bounds are
    /// inclusive.
    pub fn summarize_portfolio(
        &self,
        id: PortfolioId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<PortfolioSummary> {
        let portfolio = self.portfolio_ref(id)?;
        let from = from.unwrap_or(portfolio.opened_on);
        let to = to.unwrap_or(self.today);

        let positions = portfolio
            .holdings
            .iter()
            .map(|h| {
                let entry = self.market.entry(&h.security_id)?;
                let market_value = entry.price.checked_times(h.quantity).ok_or_else(|| {
                    LedgerError::overflow(format!("{} x{}", h.security_id, h.quantity))
                })?;
                Ok(PositionLine {
                    display_name: entry.display_name.clone(),
                    security_id: h.security_id.clone(),
                    quantity: h.quantity,
                    market_value,
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;
        let total_value = positions
            .iter()
            .try_fold(Money::ZERO, |acc, p| acc.checked_add(p.market_value))
            .ok_or_else(|| LedgerError::overflow(format!("value of {}", id)))?;

        let operations = portfolio
            .operations
            .iter()
            .filter(|op| from <= op.date && op.date <= to)
            .cloned()
            .collect();

        Ok(PortfolioSummary {
            portfolio_id: id,
            label: portfolio.label.clone(),
            as_of: self.today,
            positions,
            total_value,
            operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::OperationKind;
    use super::*;
    use crate::Side;

    #[test]
    fn test_summary_defaults_cover_whole_history() {
        let mut ledger = ledger();
        let a = funded_client(&mut ledger, "A", 200.0);
        let pid = ledger.open_portfolio(Some(a.into()), "Carteira 2").unwrap();
        ledger.execute_operation(pid, Side::Buy, "CUR", 10).unwrap();
        ledger.advance_day(None);
        ledger.execute_operation(pid, Side::Buy, "ACME", 2).unwrap();

        let summary = ledger.summarize_portfolio(pid, None, None).unwrap();
        assert_eq!(summary.portfolio_id, pid);
        assert_eq!(summary.label, "Carteira 2");
        assert_eq!(summary.as_of, date("2023-11-02"));
        assert_eq!(summary.positions.len(), 2);
        assert_eq!(summary.positions[0].display_name, "Curium Holdings");
        assert_eq!(summary.positions[0].market_value, Money::from_f64(50.0));
        assert_eq!(summary.total_value, Money::from_f64(90.0));

        let kinds: Vec<_> = summary.operations.iter().map(|op| op.kind).collect();
        assert_eq!(
            kinds,
            vec![OperationKind::Open, OperationKind::Buy, OperationKind::Buy]
        );
    }

    #[test]
    fn test_summary_window_is_inclusive() {
        let mut ledger = ledger();
        let a = funded_client(&mut ledger, "A", 200.0);
        let pid = ledger.open_portfolio(Some(a.into()), "Main").unwrap();
        for _ in 0..3 {
            ledger.advance_day(None);
            ledger.execute_operation(pid, Side::Buy, "CUR", 1).unwrap();
        }

        let summary = ledger
            .summarize_portfolio(pid, Some(date("2023-11-02")), Some(date("2023-11-03")))
            .unwrap();
        let dates: Vec<_> = summary.operations.iter().map(|op| op.date).collect();
        assert_eq!(dates, vec![date("2023-11-02"), date("2023-11-03")]);
    }

    #[test]
    fn test_summary_of_unknown_portfolio() {
        let ledger = ledger();
        assert!(matches!(
            ledger.summarize_portfolio(PortfolioId(5), None, None),
            Err(LedgerError::NotFound(_))
        ));
    }
}
