//! Shared status key-value store.
//!
//! The lifecycle manager publishes its descriptor map here after every
//! transition so independent UI surfaces (a status badge polling every
//! couple of seconds) can observe load progress without holding a
//! reference to the manager.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::errors::Result;

/// A shared key-value space for cross-surface status visibility.
///
/// Implementations must tolerate concurrent readers; the lifecycle manager
/// is the only writer for its keys.
pub trait StatusStore: Send + Sync {
    /// Replace the value under `key`.
    fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Current value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
}

/// Key under which the lifecycle manager publishes its descriptor map.
pub const MODELS_STATUS_KEY: &str = "models.status";

/// Process-local status store backed by a map.
#[derive(Default)]
pub struct MemoryStatusStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStatusStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for MemoryStatusStore {
    fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let _ = self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.read().get(key).cloned())
    }
}
