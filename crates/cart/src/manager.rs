//! Cart state plus its durable mirror.

use std::sync::Mutex;

use toolkart_core::{Price, ProductId, ProductSummary, UserId};
use toolkart_storage::{KeyValueStore, get_json, keys, set_json};

use crate::state::{CartItem, CartState};

/// Owns the in-memory cart and mirrors every mutation to the key-value store.
///
/// The in-memory state is authoritative: a failed write is logged and
/// swallowed, never surfaced to the caller and never rolled back. A snapshot
/// that is missing or fails to decode hydrates as the empty cart.
#[derive(Debug)]
pub struct CartManager<S> {
    state: Mutex<CartState>,
    store: S,
    key: String,
}

impl<S: KeyValueStore> CartManager<S> {
    /// Manager for the cart of `user` (or the guest cart).
    pub fn new(store: S, user: Option<UserId>) -> Self {
        Self {
            state: Mutex::new(CartState::empty()),
            store,
            key: keys::cart_key(user),
        }
    }

    /// Load the persisted snapshot. Missing or corrupt data falls back to the
    /// empty cart; the stored total is recomputed rather than trusted.
    pub async fn hydrate(&self) {
        let loaded = match get_json::<CartState, _>(&self.store, &self.key).await {
            Ok(Some(mut snapshot)) => {
                snapshot.normalize();
                snapshot
            }
            Ok(None) => CartState::empty(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "cart snapshot unreadable, starting empty");
                CartState::empty()
            }
        };
        self.with_state(|state| *state = loaded);
    }

    pub async fn add_item(&self, product: &ProductSummary) {
        self.with_state(|state| state.add(product));
        self.persist().await;
    }

    pub async fn remove_item(&self, id: &ProductId) {
        self.with_state(|state| state.remove(id));
        self.persist().await;
    }

    /// Set a line's quantity. Zero removes the line.
    pub async fn update_quantity(&self, id: &ProductId, quantity: u32) {
        self.with_state(|state| state.set_quantity(id, quantity));
        self.persist().await;
    }

    pub async fn clear(&self) {
        self.with_state(CartState::clear);
        self.persist().await;
    }

    /// Replace the whole cart from a server-side read.
    pub async fn replace(&self, items: Vec<CartItem>) {
        self.with_state(|state| state.replace(items));
        self.persist().await;
    }

    pub fn snapshot(&self) -> CartState {
        self.with_state(|state| state.clone())
    }

    pub fn total(&self) -> Price {
        self.with_state(|state| state.total())
    }

    /// Local sum of line quantities.
    pub fn count(&self) -> u64 {
        self.with_state(|state| state.count())
    }

    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.with_state(|state| state.quantity_of(id))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CartState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    async fn persist(&self) {
        let snapshot = self.snapshot();
        if let Err(err) = set_json(&self.store, &self.key, &snapshot).await {
            tracing::warn!(key = %self.key, error = %err, "failed to persist cart snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use toolkart_storage::{FailingStore, MemoryStore};

    use super::*;

    fn widget() -> ProductSummary {
        ProductSummary {
            id: "p1".parse().unwrap(),
            name: "Widget".to_string(),
            price: Price::new(dec!(10)),
            image: None,
            brand_logo: None,
        }
    }

    #[tokio::test]
    async fn mutations_are_mirrored_to_the_store() {
        let store = MemoryStore::new();
        let cart = CartManager::new(store.clone(), None);

        cart.add_item(&widget()).await;

        let rehydrated = CartManager::new(store, None);
        rehydrated.hydrate().await;
        assert_eq!(rehydrated.quantity_of(&widget().id), 1);
        assert_eq!(rehydrated.total(), Price::new(dec!(10)));
    }

    #[tokio::test]
    async fn corrupt_snapshot_hydrates_as_empty() {
        let store = MemoryStore::new();
        store.set(&keys::cart_key(None), "{broken").await.unwrap();

        let cart = CartManager::new(store, None);
        cart.hydrate().await;
        assert!(cart.snapshot().is_empty());
    }

    #[tokio::test]
    async fn hydrate_recomputes_a_stale_stored_total() {
        let store = MemoryStore::new();
        let tampered = r#"{
            "items": [{ "id": "p1", "name": "Widget", "price": "10", "quantity": 2 }],
            "total": "999"
        }"#;
        store.set(&keys::cart_key(None), tampered).await.unwrap();

        let cart = CartManager::new(store, None);
        cart.hydrate().await;
        assert_eq!(cart.total(), Price::new(dec!(20)));
    }

    #[tokio::test]
    async fn persist_failure_keeps_in_memory_state_live() {
        let cart = CartManager::new(FailingStore, None);

        cart.add_item(&widget()).await;
        cart.add_item(&widget()).await;

        assert_eq!(cart.quantity_of(&widget().id), 2);
        assert_eq!(cart.total(), Price::new(dec!(20)));
    }

    #[tokio::test]
    async fn carts_for_different_users_do_not_collide() {
        let store = MemoryStore::new();
        let guest = CartManager::new(store.clone(), None);
        let user = CartManager::new(store.clone(), Some(UserId::new(7)));

        guest.add_item(&widget()).await;

        user.hydrate().await;
        assert!(user.snapshot().is_empty());
    }
}
