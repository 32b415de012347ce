//! `toolkart-session` — authenticated identity and its persistence.
//!
//! The session is two durable values: the bearer token and the cached user
//! profile. [`SessionManager`] owns the live session and exposes the
//! [`IdentityProvider`] seam other layers use to ask "who is signed in?".

pub mod manager;
pub mod store;

pub use manager::{IdentityProvider, SessionManager};
pub use store::{Session, SessionStore};
