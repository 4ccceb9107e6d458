//! Type-safe price representation using decimal arithmetic.
//!
//! The backend serializes `DecimalField` values as JSON strings
//! (e.g. `"1299.00"`), which `rust_decimal`'s `serde-with-str` handles
//! transparently. Prices are never recomputed client-side from unit price
//! and quantity; server-computed totals are summed as-is so discounts and
//! other pricing rules cannot drift.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_deserializes_from_string() {
        let price: Price = serde_json::from_str("\"1299.00\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(129_900, 2));
    }

    #[test]
    fn test_price_sum() {
        let total: Price = ["10.50", "2.25"]
            .iter()
            .map(|s| Price::new(s.parse().unwrap()))
            .sum();
        assert_eq!(total.to_string(), "12.75");
    }
}
