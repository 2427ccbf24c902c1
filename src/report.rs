//! Fixed-width portfolio report
//!
//! Renders a [`PortfolioSummary`] as a 50-column text report:
//!
//! ```text
//! --------------------------------------------------
//! PORTFOLIO #000001 / Main 2023-11-02
//! --------------------------------------------------
//!                   ** HOLDINGS **
//! --------------------------------------------------
//! Curium Holdings     CUR         10       50.00
//! --------------------------------------------------
//! TOTAL                                      50.00
//! --------------------------------------------------
//!                  ** OPERATIONS **
//! --------------------------------------------------
//! 2023-11-01 BUY       CUR         10       50.00
//! --------------------------------------------------
//! ```

use std::fmt;

use crate::ledger::PortfolioSummary;

pub const REPORT_WIDTH: usize = 50;

fn centered(title: &str) -> String {
    format!("{:^width$}", title, width = REPORT_WIDTH)
        .trim_end()
        .to_string()
}

/// Render a summary. Operation rows missing a security, quantity or value
/// (the OPEN/CLOSE entries) are left out.
pub fn render_summary(summary: &PortfolioSummary) -> String {
    summary.to_string()
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(REPORT_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "PORTFOLIO #{:06} / {} {}",
            self.portfolio_id.0, self.label, self.as_of
        )?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", centered("** HOLDINGS **"))?;
        writeln!(f, "{rule}")?;
        for p in &self.positions {
            writeln!(
                f,
                "{:<20}{:<5}{:>9}{:>12.2}",
                p.display_name,
                p.security_id.as_str(),
                p.quantity,
                p.market_value.to_f64()
            )?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "TOTAL{:32}{:>12.2}", "", self.total_value.to_f64())?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", centered("** OPERATIONS **"))?;
        writeln!(f, "{rule}")?;
        for op in &self.operations {
            let (Some(security), Some(quantity), Some(value)) =
                (&op.security_id, op.quantity, op.total_value)
            else {
                continue;
            };
            writeln!(
                f,
                "{} {:<8}  {:<5}{:>9}{:>12.2}",
                op.date,
                op.kind,
                security.as_str(),
                quantity,
                value.to_f64()
            )?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{OperationKind, OperationRecord, PositionLine};
    use crate::{parse_date, Money, PortfolioId, SecurityId, Side};

    fn summary() -> PortfolioSummary {
        let d = parse_date("2023-11-01").unwrap();
        PortfolioSummary {
            portfolio_id: PortfolioId(7),
            label: "Carteira 2".to_string(),
            as_of: parse_date("2023-11-02").unwrap(),
            positions: vec![PositionLine {
                display_name: "Curium Holdings".to_string(),
                security_id: SecurityId::new("CUR"),
                quantity: 10,
                market_value: Money::from_f64(50.0),
            }],
            total_value: Money::from_f64(50.0),
            operations: vec![
                OperationRecord::lifecycle(d, OperationKind::Open),
                OperationRecord::trade(d, Side::Buy, SecurityId::new("CUR"), 10, Money::from_f64(50.0)),
            ],
        }
    }

    #[test]
    fn test_render_layout() {
        let text = render_summary(&summary());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "-".repeat(50));
        assert_eq!(lines[1], "PORTFOLIO #000007 / Carteira 2 2023-11-02");
        assert_eq!(lines[3], "                  ** HOLDINGS **");
        assert_eq!(lines[5], "Curium Holdings     CUR         10       50.00");
        assert_eq!(lines[7], format!("TOTAL{}{:>12}", " ".repeat(32), "50.00"));
        assert_eq!(lines[9], "                 ** OPERATIONS **");
        // OPEN row is skipped; only the BUY appears
        assert_eq!(lines[11], "2023-11-01 BUY       CUR         10       50.00");
        assert_eq!(lines[12], "-".repeat(50));
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn test_render_empty_portfolio() {
        let mut s = summary();
        s.positions.clear();
        s.operations.truncate(1);
        s.total_value = Money::ZERO;

        let text = render_summary(&s);
        assert_eq!(text, s.to_string());
        assert!(text.contains("TOTAL"));
        assert!(text.contains("0.00"));
        assert!(!text.contains("OPEN"));
    }
}
