//! In-memory store implementations used by tests across the workspace.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::kv::{KeyValueStore, StorageError};

/// In-memory [`KeyValueStore`]. Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Test-inspection helper.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Store whose writes always fail. Exercises the contract that persistence
/// failures are logged and swallowed while in-memory state stays live.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("store unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("store unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("store unavailable".to_string()))
    }
}
