//! `toolkart-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;
pub mod product;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UserId, WishlistId};
pub use money::Price;
pub use product::ProductSummary;
