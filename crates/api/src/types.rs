//! Wire shapes for the storefront backend.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use toolkart_core::{Price, ProductId, ProductSummary, UserId, WishlistId};

use crate::error::ApiError;

/// The backend's standard response envelope.
///
/// Business rejections arrive as HTTP 200 with `success: false`, a message,
/// and sometimes a field-level `errors` map.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Collapse the envelope into a typed payload or an [`ApiError`].
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message.unwrap_or_default(),
                errors: self.errors.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| ApiError::Parse("missing data in successful response".to_string()))
    }

    /// For mutation acknowledgements that carry no payload worth keeping.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: self.message.unwrap_or_default(),
                errors: self.errors.unwrap_or_default(),
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

/// Profile of an authenticated user as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Successful login/register outcome: the bearer token plus the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: UserDetails,
}

/// Raw `{ success, message, token, user }` body of `/login` and `/register`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDetails>,
}

impl AuthResponse {
    pub fn into_session(self) -> Result<AuthSession, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                message: self.message.unwrap_or_default(),
                errors: self.errors.unwrap_or_default(),
            });
        }
        match (self.token, self.user) {
            (Some(token), Some(user)) => Ok(AuthSession { token, user }),
            _ => Err(ApiError::Parse(
                "login response missing token or user".to_string(),
            )),
        }
    }
}

/// Registration form fields.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog / search
// ────────────────────────────────────────────────────────────────────────────

/// Result ordering accepted by the search endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }
}

/// Parameters of one search request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub text: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub sort_by: Option<SortBy>,
    pub limit: u32,
    pub page: u32,
}

impl SearchQuery {
    /// Query-string pairs, omitting unset filters.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.text.clone())];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(brand) = &self.brand {
            params.push(("brand", brand.clone()));
        }
        if let Some(min) = &self.min_price {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = &self.max_price {
            params.push(("max_price", max.to_string()));
        }
        if let Some(sort) = &self.sort_by {
            params.push(("sort_by", sort.as_str().to_string()));
        }
        params.push(("limit", self.limit.to_string()));
        params.push(("page", self.page.to_string()));
        params
    }
}

/// One product row in a search result page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductHit {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub brand: Option<BrandRef>,
}

/// Brand block attached to catalog rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrandRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl ProductHit {
    /// The shape cart/wishlist mutations take as input.
    pub fn to_summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            brand_logo: self.brand.as_ref().and_then(|b| b.logo.clone()),
        }
    }
}

/// One page of search results: `{ data, current_page, last_page }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "data")]
    pub items: Vec<ProductHit>,
    pub current_page: u32,
    pub last_page: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Cart
// ────────────────────────────────────────────────────────────────────────────

/// One row of the server-side cart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `GET /cart-count/{userId}`. The count itself arrives as either a
/// number or a numeric string depending on the backend code path.
#[derive(Debug, Deserialize)]
pub struct CartCountResponse {
    #[serde(deserialize_with = "flexible_u64")]
    pub cart_count: u64,
}

fn flexible_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wishlist
// ────────────────────────────────────────────────────────────────────────────

/// Product fields carried on a wishlist row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WishlistProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

/// One remote-owned wishlist row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WishlistEntry {
    pub wishlist_id: WishlistId,
    #[serde(flatten)]
    pub product: WishlistProduct,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// Body of `GET /wishlist/{userId}`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WishlistPage {
    #[serde(default)]
    pub wishlist: Vec<WishlistEntry>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn rejected_envelope_surfaces_message_and_field_errors() {
        let body = r#"{
            "success": false,
            "message": "The given data was invalid.",
            "errors": { "query": ["The query field is required."] }
        }"#;
        let envelope: Envelope<SearchPage> = serde_json::from_str(body).unwrap();

        let err = envelope.into_result().unwrap_err();
        let ApiError::Rejected { message, errors } = err else {
            panic!("expected rejection");
        };
        assert_eq!(message, "The given data was invalid.");
        assert_eq!(errors["query"], vec!["The query field is required."]);
    }

    #[test]
    fn search_page_parses_the_nested_data_field() {
        let body = r#"{
            "success": true,
            "data": {
                "data": [
                    { "id": 7, "name": "Widget", "price": "19.99",
                      "brand": { "name": "Acme", "logo": "acme.png" } }
                ],
                "current_page": 1,
                "last_page": 3
            }
        }"#;
        let envelope: Envelope<SearchPage> = serde_json::from_str(body).unwrap();
        let page = envelope.into_result().unwrap();

        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 3);
        let hit = &page.items[0];
        assert_eq!(hit.id.as_str(), "7");
        assert_eq!(hit.price, Price::new(dec!(19.99)));
        assert_eq!(
            hit.to_summary().display_image().as_deref(),
            Some("acme.png")
        );
    }

    #[test]
    fn cart_count_accepts_number_or_numeric_string() {
        let from_number: CartCountResponse = serde_json::from_str(r#"{"cart_count": 4}"#).unwrap();
        let from_text: CartCountResponse = serde_json::from_str(r#"{"cart_count": "4"}"#).unwrap();
        assert_eq!(from_number.cart_count, 4);
        assert_eq!(from_text.cart_count, 4);
    }

    #[test]
    fn login_response_requires_token_and_user_on_success() {
        let body = r#"{ "success": true, "message": "ok", "token": "t" }"#;
        let resp: AuthResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(resp.into_session(), Err(ApiError::Parse(_))));
    }

    #[test]
    fn query_params_omit_unset_filters() {
        let query = SearchQuery {
            text: "shoes".to_string(),
            limit: 10,
            page: 2,
            sort_by: Some(SortBy::PriceDesc),
            ..Default::default()
        };
        let params = query.to_params();
        assert!(params.contains(&("query", "shoes".to_string())));
        assert!(params.contains(&("sort_by", "price_desc".to_string())));
        assert!(params.contains(&("page", "2".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "brand"));
    }
}
