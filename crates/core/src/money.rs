//! Exact decimal price values.
//!
//! Prices come off the wire either as JSON numbers (`123.5`) or as formatted
//! strings (`"123.50"`). Both forms parse to the same `Price`. Arithmetic is
//! exact decimal arithmetic, never floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// A monetary amount in the storefront's single display currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Line total for `quantity` units at this price.
    pub fn times(&self, quantity: u32) -> Price {
        Price(self.0 * Decimal::from(quantity))
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Price)
            .map_err(|e| DomainError::validation(format!("price: {e}")))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawPrice::deserialize(deserializer)? {
            RawPrice::Number(n) => Decimal::try_from(n)
                .map(Price)
                .map_err(|e| serde::de::Error::custom(format!("price: {e}"))),
            RawPrice::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}
