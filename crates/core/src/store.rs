//! PersistenceStore trait — key/value persistence for session state.
//!
//! The engine keeps all durable state behind this seam. Values are JSON so
//! backends stay schema-agnostic. Implementations: in-memory (testing,
//! ephemeral) and JSONL file; both live in `genloom-session`.

use crate::error::StoreError;
use async_trait::async_trait;

/// The core PersistenceStore trait.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Fetch a value by key. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> std::result::Result<Option<serde_json::Value>, StoreError>;

    /// Store a value under a key, replacing any previous value.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> std::result::Result<(), StoreError>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> std::result::Result<bool, StoreError>;
}
