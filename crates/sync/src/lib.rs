//! `toolkart-sync` — confirm-then-apply synchronization of cart and wishlist.
//!
//! The backend is the source of truth for wishlist membership and cart
//! counts. Local state is therefore never updated optimistically: a mutation
//! first validates its input, then requires a signed-in user, then performs
//! the remote call, and only applies the local change once the backend has
//! confirmed success. Every outcome, success or failure, is reported through
//! the [`Notifier`] seam; errors never propagate past this layer.

pub mod coordinator;
pub mod guard;
pub mod notify;

pub use coordinator::{SyncCoordinator, SyncOutcome};
pub use guard::{MutationGuard, MutationPermit};
pub use notify::{Notice, NoticeKind, Notifier, TracingNotifier};
