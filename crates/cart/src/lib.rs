//! `toolkart-cart` — local cart state and its durable mirror.
//!
//! [`CartState`] is the pure reducer: every mutation is a total function that
//! recomputes the cart total. [`CartManager`] wraps it with persistence:
//! every mutation is mirrored to the key-value store, and startup hydrates
//! from the last snapshot (or the empty cart when none decodes).

pub mod manager;
pub mod state;

pub use manager::CartManager;
pub use state::{CartItem, CartState};
