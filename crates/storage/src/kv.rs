//! The key-value store boundary and JSON helpers.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage-level error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store failed (connection, I/O, query).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("corrupt value under key '{key}': {detail}")]
    Corrupt { key: String, detail: String },
}

/// Async string-keyed, string-valued durable store.
///
/// Values are opaque to the store; callers serialize to JSON via
/// [`get_json`]/[`set_json`]. Implementations must tolerate concurrent use
/// through a shared handle.
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value. Missing key yields `Ok(None)`; an undecodable
/// value is reported as [`StorageError::Corrupt`], never a panic.
pub async fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            detail: e.to_string(),
        })
}

/// Encode a value as JSON and write it under `key`.
pub async fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore,
{
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Backend(e.to_string()))?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::memory::MemoryStore;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        count: u32,
    }

    #[tokio::test]
    async fn json_roundtrip_through_the_store() {
        let store = MemoryStore::default();
        set_json(&store, "snap", &Snapshot { count: 3 }).await.unwrap();

        let loaded: Option<Snapshot> = get_json(&store, "snap").await.unwrap();
        assert_eq!(loaded, Some(Snapshot { count: 3 }));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryStore::default();
        let loaded: Option<Snapshot> = get_json(&store, "absent").await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn undecodable_value_is_reported_as_corrupt() {
        let store = MemoryStore::default();
        store.set("snap", "{not json").await.unwrap();

        let result: Result<Option<Snapshot>, _> = get_json(&store, "snap").await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
