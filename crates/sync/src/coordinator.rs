//! The confirm-then-apply coordinator for cart and wishlist mutations.

use std::collections::HashSet;
use std::sync::Mutex;

use futures::future::join_all;
use toolkart_api::{CartApi, WishlistApi, WishlistEntry};
use toolkart_cart::{CartItem, CartManager};
use toolkart_core::{ProductId, ProductSummary};
use toolkart_session::IdentityProvider;
use toolkart_storage::KeyValueStore;

use crate::guard::MutationGuard;
use crate::notify::{Notice, Notifier};

/// How a mutation attempt ended. Every path emits a notice; none returns an
/// error to the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backend confirmed the mutation and local state was updated.
    Completed,
    /// Validation, authentication, or the backend rejected it. Local state
    /// is untouched.
    Failed,
    /// A mutation for the same target was already in flight.
    Ignored,
}

/// Client-side projection of the remote wishlist.
///
/// `members` answers the derived "is this product wishlisted?" question;
/// `entries` is the last-fetched list. Both are replaced wholesale on every
/// fetch, so the projection never outlives server truth by more than one
/// confirmed mutation.
#[derive(Debug, Default)]
struct WishlistView {
    entries: Vec<WishlistEntry>,
    members: HashSet<ProductId>,
}

impl WishlistView {
    fn replace(&mut self, entries: Vec<WishlistEntry>) {
        self.members = entries
            .iter()
            .map(|entry| entry.product.product_id.clone())
            .collect();
        self.entries = entries;
    }

    fn mark_added(&mut self, product: &ProductId) {
        self.members.insert(product.clone());
    }

    fn mark_removed(&mut self, product: &ProductId) {
        self.members.remove(product);
        self.entries
            .retain(|entry| &entry.product.product_id != product);
    }
}

/// Orchestrates cart and wishlist mutations against the backend.
///
/// Protocol, in order: validate the product payload, require a signed-in
/// user, claim the per-target in-flight permit, perform the remote call, and
/// apply the local change only on confirmed success. Failure notices carry
/// the server's own message when it sent one.
pub struct SyncCoordinator<A, I, N, S> {
    api: A,
    identity: I,
    notifier: N,
    cart: CartManager<S>,
    guard: MutationGuard,
    wishlist: Mutex<WishlistView>,
}

impl<A, I, N, S> SyncCoordinator<A, I, N, S>
where
    A: CartApi + WishlistApi,
    I: IdentityProvider,
    N: Notifier,
    S: KeyValueStore,
{
    pub fn new(api: A, identity: I, notifier: N, cart: CartManager<S>) -> Self {
        Self {
            api,
            identity,
            notifier,
            cart,
            guard: MutationGuard::new(),
            wishlist: Mutex::new(WishlistView::default()),
        }
    }

    /// The local cart this coordinator applies confirmed mutations to.
    pub fn cart(&self) -> &CartManager<S> {
        &self.cart
    }

    // ────────────────────────────────────────────────────────────────────
    // Wishlist
    // ────────────────────────────────────────────────────────────────────

    pub async fn add_to_wishlist(&self, product: &ProductSummary) -> SyncOutcome {
        if let Err(err) = product.validate() {
            self.notifier.notify(Notice::error("Wishlist", err.to_string()));
            return SyncOutcome::Failed;
        }
        let Some(user) = self.require_user("save items to your wishlist") else {
            return SyncOutcome::Failed;
        };
        let target = format!("wishlist:{}", product.id);
        let Some(_permit) = self.guard.try_begin(&target) else {
            tracing::debug!(%target, "mutation already in flight, ignoring");
            return SyncOutcome::Ignored;
        };

        match self.api.add_to_wishlist(user, &product.id).await {
            Ok(()) => {
                self.with_wishlist(|view| view.mark_added(&product.id));
                self.notifier.notify(Notice::success(
                    "Wishlist",
                    format!("{} added to your wishlist", product.name),
                ));
                SyncOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(product = %product.id, error = %err, "wishlist add failed");
                self.notifier
                    .notify(Notice::error("Wishlist", err.user_message()));
                SyncOutcome::Failed
            }
        }
    }

    pub async fn remove_from_wishlist(&self, product: &ProductId, name: &str) -> SyncOutcome {
        let Some(user) = self.require_user("manage your wishlist") else {
            return SyncOutcome::Failed;
        };
        let target = format!("wishlist:{product}");
        let Some(_permit) = self.guard.try_begin(&target) else {
            tracing::debug!(%target, "mutation already in flight, ignoring");
            return SyncOutcome::Ignored;
        };

        match self.api.remove_from_wishlist(user, product).await {
            Ok(()) => {
                self.with_wishlist(|view| view.mark_removed(product));
                self.notifier.notify(Notice::success(
                    "Wishlist",
                    format!("{name} removed from your wishlist"),
                ));
                SyncOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(product = %product, error = %err, "wishlist remove failed");
                self.notifier
                    .notify(Notice::error("Wishlist", err.user_message()));
                SyncOutcome::Failed
            }
        }
    }

    /// Remove every current entry, concurrently. Overall success requires
    /// every removal to succeed; afterwards the list is re-fetched either way
    /// because the server may be partially cleared.
    pub async fn clear_wishlist(&self) -> SyncOutcome {
        let Some(user) = self.require_user("manage your wishlist") else {
            return SyncOutcome::Failed;
        };
        let Some(_permit) = self.guard.try_begin("wishlist:clear") else {
            return SyncOutcome::Ignored;
        };

        let entries = self.wishlist_entries();
        if entries.is_empty() {
            self.notifier
                .notify(Notice::info("Wishlist", "Your wishlist is already empty"));
            return SyncOutcome::Completed;
        }

        let removals = entries
            .iter()
            .map(|entry| self.api.remove_from_wishlist(user, &entry.product.product_id));
        let failures: Vec<_> = join_all(removals)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        let outcome = if failures.is_empty() {
            self.notifier
                .notify(Notice::success("Wishlist", "Wishlist cleared"));
            SyncOutcome::Completed
        } else {
            tracing::warn!(failed = failures.len(), total = entries.len(), "clear wishlist incomplete");
            self.notifier.notify(Notice::error(
                "Wishlist",
                format!(
                    "Could not remove {} of {} items: {}",
                    failures.len(),
                    entries.len(),
                    failures[0].user_message()
                ),
            ));
            SyncOutcome::Failed
        };

        self.refresh_wishlist().await;
        outcome
    }

    /// Re-fetch the wishlist projection. Best-effort: a failed fetch keeps
    /// the previous projection.
    pub async fn refresh_wishlist(&self) -> bool {
        let Some(user) = self.identity.current_user() else {
            return false;
        };
        match self.api.fetch_wishlist(user).await {
            Ok(entries) => {
                self.with_wishlist(|view| view.replace(entries));
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "wishlist fetch failed");
                false
            }
        }
    }

    /// Derived membership from the last-fetched list plus confirmed mutations.
    pub fn is_in_wishlist(&self, product: &ProductId) -> bool {
        self.with_wishlist(|view| view.members.contains(product))
    }

    pub fn wishlist_entries(&self) -> Vec<WishlistEntry> {
        self.with_wishlist(|view| view.entries.clone())
    }

    // ────────────────────────────────────────────────────────────────────
    // Cart
    // ────────────────────────────────────────────────────────────────────

    pub async fn add_to_cart(&self, product: &ProductSummary) -> SyncOutcome {
        if let Err(err) = product.validate() {
            self.notifier.notify(Notice::error("Cart", err.to_string()));
            return SyncOutcome::Failed;
        }
        let Some(user) = self.require_user("add items to your cart") else {
            return SyncOutcome::Failed;
        };
        let target = format!("cart:{}", product.id);
        let Some(_permit) = self.guard.try_begin(&target) else {
            tracing::debug!(%target, "mutation already in flight, ignoring");
            return SyncOutcome::Ignored;
        };

        match self.api.add_to_cart(user, &product.id, 1).await {
            Ok(()) => {
                self.cart.add_item(product).await;
                self.notifier.notify(Notice::success(
                    "Cart",
                    format!("{} added to your cart", product.name),
                ));
                SyncOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(product = %product.id, error = %err, "cart add failed");
                self.notifier.notify(Notice::error("Cart", err.user_message()));
                SyncOutcome::Failed
            }
        }
    }

    pub async fn remove_from_cart(&self, product: &ProductId, name: &str) -> SyncOutcome {
        let Some(_user) = self.require_user("manage your cart") else {
            return SyncOutcome::Failed;
        };
        let target = format!("cart:{product}");
        let Some(_permit) = self.guard.try_begin(&target) else {
            tracing::debug!(%target, "mutation already in flight, ignoring");
            return SyncOutcome::Ignored;
        };

        match self.api.remove_from_cart(product).await {
            Ok(()) => {
                self.cart.remove_item(product).await;
                self.notifier.notify(Notice::success(
                    "Cart",
                    format!("{name} removed from your cart"),
                ));
                SyncOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(product = %product, error = %err, "cart remove failed");
                self.notifier.notify(Notice::error("Cart", err.user_message()));
                SyncOutcome::Failed
            }
        }
    }

    /// Set a line's quantity. Zero means removal, and uses the removal
    /// endpoint; any other value is confirmed through the add-to-cart
    /// endpoint, which upserts the quantity server-side.
    pub async fn update_cart_quantity(&self, product: &ProductId, quantity: u32) -> SyncOutcome {
        let Some(user) = self.require_user("manage your cart") else {
            return SyncOutcome::Failed;
        };
        let target = format!("cart:{product}");
        let Some(_permit) = self.guard.try_begin(&target) else {
            tracing::debug!(%target, "mutation already in flight, ignoring");
            return SyncOutcome::Ignored;
        };

        let result = if quantity == 0 {
            self.api.remove_from_cart(product).await
        } else {
            self.api.add_to_cart(user, product, quantity).await
        };

        match result {
            Ok(()) => {
                self.cart.update_quantity(product, quantity).await;
                SyncOutcome::Completed
            }
            Err(err) => {
                tracing::warn!(product = %product, quantity, error = %err, "cart quantity update failed");
                self.notifier.notify(Notice::error("Cart", err.user_message()));
                SyncOutcome::Failed
            }
        }
    }

    /// Cart badge count: the server-computed count when signed in and
    /// reachable, the local sum otherwise.
    pub async fn cart_count(&self) -> u64 {
        let Some(user) = self.identity.current_user() else {
            return self.cart.count();
        };
        match self.api.cart_count(user).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "cart count fetch failed, using local sum");
                self.cart.count()
            }
        }
    }

    /// Replace the local cart with the server-side cart. Used after sign-in,
    /// when the server cart becomes authoritative for this identity.
    pub async fn refresh_cart_from_remote(&self) -> bool {
        let Some(user) = self.identity.current_user() else {
            return false;
        };
        match self.api.cart_items(user).await {
            Ok(lines) => {
                let items = lines
                    .into_iter()
                    .map(|line| CartItem {
                        id: line.product_id,
                        name: line.name,
                        price: line.price,
                        quantity: line.quantity,
                        image: line.image,
                    })
                    .collect();
                self.cart.replace(items).await;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "cart refresh failed");
                false
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Helpers
    // ────────────────────────────────────────────────────────────────────

    fn require_user(&self, action: &str) -> Option<toolkart_core::UserId> {
        let user = self.identity.current_user();
        if user.is_none() {
            self.notifier.notify(Notice::error(
                "Sign in required",
                format!("Please sign in to {action}."),
            ));
        }
        user
    }

    fn with_wishlist<R>(&self, f: impl FnOnce(&mut WishlistView) -> R) -> R {
        let mut guard = match self.wishlist.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}
