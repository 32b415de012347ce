//! Storage key layout.
//!
//! All durable keys live here so no two features can collide on a name.

use toolkart_core::UserId;

/// Bearer token of the signed-in user.
pub const USER_TOKEN: &str = "userToken";

/// Cached profile of the signed-in user.
pub const USER_INFO: &str = "userInfo";

/// Recent search history (most-recent-first).
pub const RECENT_SEARCHES: &str = "recentSearches";

/// Search keyword frequency table.
pub const HOT_KEYWORDS: &str = "hotKeywords";

/// Cart snapshot key, scoped by user identity.
///
/// Scoping the key means signing into a different account on the same device
/// can never surface another user's cart. Guest carts persist under their own
/// key and survive sign-in/sign-out.
pub fn cart_key(user: Option<UserId>) -> String {
    match user {
        Some(user) => format!("cart:user:{user}"),
        None => "cart:guest".to_string(),
    }
}
