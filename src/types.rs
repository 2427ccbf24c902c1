//! Core data types used across the ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used by market/order files, configs and reports
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

// ============================================================================
// Identifiers
// ============================================================================

/// Client identifier, assigned sequentially from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Portfolio identifier, assigned sequentially from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(pub u64);

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "portfolio#{}", self.0)
    }
}

/// Scheduled order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

/// Security identifier (ticker) using Arc<str> for cheap cloning
///
/// Tickers are copied into holdings, operation records and scheduled orders,
/// so the backing string is shared instead of reallocated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityId(#[serde(with = "arc_str_serde")] std::sync::Arc<str>);

mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl SecurityId {
    pub fn new(s: impl AsRef<str>) -> Self {
        SecurityId(std::sync::Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(s: &str) -> Self {
        SecurityId::new(s)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

// ============================================================================
// Money Type - Precise Decimal Arithmetic for Monetary Values
// ============================================================================

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::ops::{Add, Div, Neg, SubAssign};

/// Money type for cash balances, prices and trade totals.
///
/// Wraps `rust_decimal::Decimal`. Holder shares are computed by dividing a
/// trade total by the holder count, and balance sufficiency is decided by
/// comparing those shares, so f64 rounding would make the all-or-nothing
/// checks unreliable.
///
/// # Example
/// ```
/// use brokerage_ledger::Money;
/// let price = Money::from_f64(5.0);
/// let total = price.checked_times(10).unwrap();
/// assert_eq!(total.to_f64(), 50.0);
/// ```
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::str")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create from f64
    /// Note: This conversion may lose precision for values with many decimal places
    pub fn from_f64(value: f64) -> Self {
        Money(Decimal::try_from(value).unwrap_or_else(|_| {
            if value.is_nan() || value.is_infinite() {
                Decimal::ZERO
            } else {
                Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
            }
        }))
    }

    /// Convert to f64 (display and approximate comparisons only)
    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn from_u64(value: u64) -> Self {
        Money(Decimal::from(value))
    }

    /// Parse a decimal literal such as `"12.50"`
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<Decimal>().ok().map(Money)
    }

    /// Value of `quantity` units at this price, `None` on overflow
    pub fn checked_times(self, quantity: u64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    /// `None` when the sum leaves the representable range
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Equal share of this amount for one of `parts` holders
    pub fn share(self, parts: usize) -> Self {
        self / Money::from_u64(parts as u64)
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Div for Money {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.0.is_zero() {
            Money::ZERO
        } else {
            Money(self.0 / rhs.0)
        }
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

#[cfg(test)]
mod money_tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let a = Money::from_f64(0.1);
        let b = Money::from_f64(0.2);
        let c = Money::from_f64(0.3);
        assert_eq!(a + b, c, "Money should handle 0.1 + 0.2 = 0.3 correctly");
    }

    #[test]
    fn test_times_and_share() {
        let price = Money::from(dec!(12.5));
        let total = price.checked_times(4).unwrap();
        assert_eq!(total, Money::from(dec!(50)));
        assert_eq!(total.share(2), Money::from(dec!(25)));
        assert_eq!(total.share(0), Money::ZERO);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from(Decimal::MAX);
        assert_eq!(huge.checked_times(2), None);
        assert_eq!(huge.checked_add(Money::from(dec!(1))), None);
        assert_eq!(
            Money::from(dec!(1.5)).checked_add(Money::from(dec!(2))),
            Some(Money::from(dec!(3.5)))
        );
        assert_eq!(Money::from(dec!(10000000000)).checked_times(u64::MAX / 2), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse(" 7.25 "), Some(Money::from(dec!(7.25))));
        assert_eq!(Money::parse("abc"), None);
    }

    #[test]
    fn test_money_serde() {
        let money = Money::from_f64(123.456);
        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, "\"123.456\"");
        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, parsed);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2023-11-11"),
            NaiveDate::from_ymd_opt(2023, 11, 11)
        );
        assert_eq!(parse_date("11/11/2023"), None);
    }

    #[test]
    fn test_date_order_matches_iso_strings() {
        let a = parse_date("2023-09-30").unwrap();
        let b = parse_date("2023-10-01").unwrap();
        assert!(a < b);
        assert!("2023-09-30" < "2023-10-01");
    }
}
