//! `reqwest` implementation of the client traits.

use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use toolkart_core::{ProductId, UserId};

use crate::client::{AuthApi, CartApi, CatalogApi, WishlistApi};
use crate::error::ApiError;
use crate::types::{
    AuthResponse, AuthSession, CartCountResponse, CartLine, Envelope, NewAccount, SearchPage,
    SearchQuery, UserDetails, WishlistEntry, WishlistPage,
};

/// HTTP client for the storefront backend.
///
/// Requests carry the bearer token once one is installed (login/register do
/// this automatically). There is no automatic retry: a failed mutation is
/// reported and the user triggers it again.
#[derive(Debug)]
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token: RwLock::new(None),
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api = Self::new(base_url);
        api.set_token(Some(token.into()));
        api
    }

    /// Install or clear the bearer token used for subsequent requests.
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    async fn get_body<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let mut req = self.client.get(self.url(path)).query(params);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        decode(resp).await
    }

    async fn post_body<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = self.bearer() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        decode(resp).await
    }
}

/// Check the HTTP status, then decode the JSON body. A non-JSON body on a
/// 2xx response (e.g. an HTML error page from a proxy) maps to `Parse`.
async fn decode<T>(resp: reqwest::Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "request failed");
        return Err(ApiError::Status(status.as_u16(), truncate(&text)));
    }

    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}

impl AuthApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        let resp: AuthResponse = self
            .post_body("login", &Credentials { email, password })
            .await?;
        let session = resp.into_session()?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn register(&self, account: &NewAccount) -> Result<AuthSession, ApiError> {
        let resp: AuthResponse = self.post_body("register", account).await?;
        let session = resp.into_session()?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn fetch_user_details(&self, user: UserId) -> Result<UserDetails, ApiError> {
        let envelope: Envelope<UserDetails> =
            self.get_body(&format!("user/{user}"), &[]).await?;
        envelope.into_result()
    }

    fn install_token(&self, token: Option<String>) {
        self.set_token(token);
    }
}

impl CatalogApi for HttpApi {
    async fn search_products(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let envelope: Envelope<SearchPage> = self
            .get_body("products/search", &query.to_params())
            .await?;
        envelope.into_result()
    }
}

impl CartApi for HttpApi {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            user_id: i64,
            product_id: &'a str,
            quantity: u32,
        }

        let envelope: Envelope<serde_json::Value> = self
            .post_body(
                "add-to-cart",
                &Body {
                    user_id: user.as_i64(),
                    product_id: product.as_str(),
                    quantity,
                },
            )
            .await?;
        envelope.into_ack()
    }

    async fn remove_from_cart(&self, product: &ProductId) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .post_body(&format!("remove-from-cart/{product}"), &serde_json::json!({}))
            .await?;
        envelope.into_ack()
    }

    async fn cart_count(&self, user: UserId) -> Result<u64, ApiError> {
        let resp: CartCountResponse = self.get_body(&format!("cart-count/{user}"), &[]).await?;
        Ok(resp.cart_count)
    }

    async fn cart_items(&self, user: UserId) -> Result<Vec<CartLine>, ApiError> {
        let envelope: Envelope<Vec<CartLine>> =
            self.get_body(&format!("cart-items/{user}"), &[]).await?;
        envelope.into_result()
    }
}

impl WishlistApi for HttpApi {
    async fn add_to_wishlist(&self, user: UserId, product: &ProductId) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .post_body("add-to-wishlist", &wishlist_body(user, product))
            .await?;
        envelope.into_ack()
    }

    async fn remove_from_wishlist(
        &self,
        user: UserId,
        product: &ProductId,
    ) -> Result<(), ApiError> {
        let envelope: Envelope<serde_json::Value> = self
            .post_body("remove-from-wishlist", &wishlist_body(user, product))
            .await?;
        envelope.into_ack()
    }

    async fn fetch_wishlist(&self, user: UserId) -> Result<Vec<WishlistEntry>, ApiError> {
        let envelope: Envelope<WishlistPage> =
            self.get_body(&format!("wishlist/{user}"), &[]).await?;
        Ok(envelope.into_result()?.wishlist)
    }
}

fn wishlist_body(user: UserId, product: &ProductId) -> serde_json::Value {
    serde_json::json!({
        "user_id": user.as_i64(),
        "product_id": product.as_str(),
    })
}
