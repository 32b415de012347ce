//! `toolkart-storage` — the on-device persistent key-value store.
//!
//! Everything durable on the device (cart snapshot, session token, user info,
//! search history) goes through the [`KeyValueStore`] boundary as JSON text.
//! `SqliteStore` is the device implementation; `MemoryStore` backs tests.

#![allow(async_fn_in_trait)]

pub mod keys;
pub mod kv;
pub mod memory;
pub mod sqlite;

pub use kv::{KeyValueStore, StorageError, get_json, set_json};
pub use memory::{FailingStore, MemoryStore};
pub use sqlite::SqliteStore;
