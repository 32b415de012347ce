//! `toolkart-api` — typed client for the storefront REST backend.
//!
//! The backend wraps every payload in a `{ success, message, data, errors }`
//! envelope and reports business rejections as `success: false` with HTTP 200.
//! This crate validates the envelope once, at the edge, so the rest of the
//! workspace only ever sees typed payloads or an [`ApiError`].

#![allow(async_fn_in_trait)]

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{AuthApi, CartApi, CatalogApi, WishlistApi};
pub use error::{ApiError, GENERIC_SERVER_ERROR};
pub use http::HttpApi;
pub use types::{
    AuthSession, CartLine, Envelope, NewAccount, ProductHit, SearchPage, SearchQuery, SortBy,
    UserDetails, WishlistEntry, WishlistPage, WishlistProduct,
};
