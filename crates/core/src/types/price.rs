//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog API sends prices as plain JSON numbers (`179.9`), so [`Price`]
//! serializes as a JSON number rather than the string form `rust_decimal`
//! uses by default.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit or line price in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("179.9").unwrap();
        assert_eq!(price, Price::from_cents(17990));

        let whole: Price = serde_json::from_str("180").unwrap();
        assert_eq!(whole, Price::from_cents(18000));
    }

    #[test]
    fn test_price_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::from_cents(13990)).unwrap();
        assert_eq!(json, "139.9");
    }

    #[test]
    fn test_price_times_quantity() {
        assert_eq!(Price::from_cents(1999).times(3), Price::from_cents(5997));
        assert_eq!(Price::from_cents(1999).times(0), Price::ZERO);
    }

    #[test]
    fn test_price_sum() {
        let total: Price = [Price::from_cents(150), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(400));
    }

    #[test]
    fn test_price_display_two_places() {
        assert_eq!(Price::from_cents(17990).to_string(), "179.90");
    }
}
