//! Type-safe price representation using decimal arithmetic.
//!
//! The backend quotes every amount as a decimal string in the store currency,
//! so prices are kept as exact decimals end to end. Float math never touches
//! money.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in the store currency.
///
/// Serializes transparently as a decimal string, matching the backend's
/// wire format for `price` and `offer_price` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Total for `qty` units of this price.
    #[must_use]
    pub fn line_total(&self, qty: u32) -> Self {
        Self(self.0 * Decimal::from(qty))
    }

    /// Sum of an iterator of prices.
    pub fn sum<I: IntoIterator<Item = Self>>(prices: I) -> Self {
        Self(prices.into_iter().map(|p| p.0).sum())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}
