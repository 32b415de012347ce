//! Client traits for the backend, one per concern.
//!
//! These are the seams the higher layers depend on; production code uses
//! [`crate::HttpApi`], tests substitute fakes.

use toolkart_core::{ProductId, UserId};

use crate::error::ApiError;
use crate::types::{AuthSession, CartLine, NewAccount, SearchPage, SearchQuery, UserDetails};

/// Authentication endpoints plus bearer-token lifecycle.
pub trait AuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;
    async fn register(&self, account: &NewAccount) -> Result<AuthSession, ApiError>;
    async fn fetch_user_details(&self, user: UserId) -> Result<UserDetails, ApiError>;

    /// Install (or clear) the bearer token used by subsequent requests.
    /// Called when a persisted session is restored and on logout.
    fn install_token(&self, token: Option<String>);
}

/// Product search.
pub trait CatalogApi {
    async fn search_products(&self, query: &SearchQuery) -> Result<SearchPage, ApiError>;
}

/// Server-side cart mutations and reads.
pub trait CartApi {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    async fn remove_from_cart(&self, product: &ProductId) -> Result<(), ApiError>;

    async fn cart_count(&self, user: UserId) -> Result<u64, ApiError>;

    async fn cart_items(&self, user: UserId) -> Result<Vec<CartLine>, ApiError>;
}

/// Server-side wishlist mutations and reads.
pub trait WishlistApi {
    async fn add_to_wishlist(&self, user: UserId, product: &ProductId) -> Result<(), ApiError>;

    async fn remove_from_wishlist(&self, user: UserId, product: &ProductId)
    -> Result<(), ApiError>;

    async fn fetch_wishlist(
        &self,
        user: UserId,
    ) -> Result<Vec<crate::types::WishlistEntry>, ApiError>;
}
