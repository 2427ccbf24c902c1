//! Market price table
//!
//! Maps each tradable security to its display name and current quote. The
//! table is only ever replaced wholesale by the market loader; trades,
//! valuations and summaries read from it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};
use crate::{Money, SecurityId};

/// One quoted security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub security_id: SecurityId,
    pub display_name: String,
    pub price: Money,
}

impl MarketEntry {
    pub fn new(security_id: impl Into<SecurityId>, display_name: impl Into<String>, price: Money) -> Self {
        Self {
            security_id: security_id.into(),
            display_name: display_name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarketTable {
    entries: HashMap<SecurityId, MarketEntry>,
}

impl MarketTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every quote with `entries`. A security listed twice keeps the
    /// last quote; negative prices are dropped.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = MarketEntry>) {
        self.entries = entries
            .into_iter()
            .filter(|e| {
                if e.price.is_negative() {
                    warn!("Dropped {} quoted at negative price {}", e.security_id, e.price);
                    return false;
                }
                true
            })
            .map(|e| (e.security_id.clone(), e))
            .collect();
    }

    pub fn get(&self, security_id: &SecurityId) -> Option<&MarketEntry> {
        self.entries.get(security_id)
    }

    /// Current price, or NotFound for an unquoted security
    pub fn price(&self, security_id: &SecurityId) -> LedgerResult<Money> {
        self.entry(security_id).map(|e| e.price)
    }

    pub fn entry(&self, security_id: &SecurityId) -> LedgerResult<&MarketEntry> {
        self.entries
            .get(security_id)
            .ok_or_else(|| LedgerError::not_found(format!("security {}", security_id)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by security id
    pub fn sorted(&self) -> Vec<&MarketEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.security_id.cmp(&b.security_id));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_all_drops_previous_quotes() {
        let mut market = MarketTable::new();
        market.replace_all(vec![MarketEntry::new("CUR", "Curium", Money::from_f64(5.0))]);
        market.replace_all(vec![MarketEntry::new("ZZZ", "Zed", Money::from_f64(1.0))]);

        assert_eq!(market.len(), 1);
        assert!(market.get(&SecurityId::new("CUR")).is_none());
        assert_eq!(market.price(&SecurityId::new("ZZZ")).unwrap(), Money::from_f64(1.0));
    }

    #[test]
    fn test_negative_prices_are_not_quoted() {
        let mut market = MarketTable::new();
        market.replace_all(vec![
            MarketEntry::new("NEG", "Neg Corp", Money::from_f64(-5.0)),
            MarketEntry::new("FREE", "Free Co", Money::ZERO),
        ]);

        assert_eq!(market.len(), 1);
        assert!(market.get(&SecurityId::new("NEG")).is_none());
        assert_eq!(market.price(&SecurityId::new("FREE")).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_unknown_security_is_not_found() {
        let market = MarketTable::new();
        let err = market.price(&SecurityId::new("NOPE")).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }
}
