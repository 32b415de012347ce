//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers here are **backend-issued**: the catalog service mints product
//! and wishlist ids, the auth service mints user ids. The client never
//! generates one.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog product.
///
/// The backend is loose about this field and emits it either as a JSON string
/// or a bare number; deserialization accepts both and normalizes to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of an authenticated user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a wishlist row (not the product it references).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WishlistId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, ": empty")));
                }
                Ok(Self(s.to_string()))
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                raw.into_string()
                    .parse()
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_string_newtype!(ProductId, "ProductId");
impl_string_newtype!(WishlistId, "WishlistId");

/// Backend id field as it appears on the wire: string or integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

impl UserId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_rejects_empty_and_blank() {
        assert!("".parse::<ProductId>().is_err());
        assert!("   ".parse::<ProductId>().is_err());
        assert!("42".parse::<ProductId>().is_ok());
    }

    #[test]
    fn product_id_deserializes_from_string_or_number() {
        let from_text: ProductId = serde_json::from_str("\"p-10\"").unwrap();
        let from_number: ProductId = serde_json::from_str("10").unwrap();
        assert_eq!(from_text.as_str(), "p-10");
        assert_eq!(from_number.as_str(), "10");
    }

    #[test]
    fn user_id_roundtrips_through_display() {
        let id = UserId::new(77);
        assert_eq!(id.to_string(), "77");
        assert_eq!(id.as_i64(), 77);
    }
}
