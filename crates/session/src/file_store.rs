//! File-based persistence backend — JSONL key/value storage.
//!
//! Each line is a JSON-encoded `{key, value}` record. The file is loaded
//! into memory on creation and flushed to disk on every mutation. This
//! gives fast reads with durable writes and keeps the file
//! human-inspectable.

use async_trait::async_trait;
use genloom_core::error::StoreError;
use genloom_core::store::PersistenceStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Serialize, Deserialize)]
struct Record {
    key: String,
    value: serde_json::Value,
}

/// A file-backed key/value store using JSONL (one record per line).
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl FileStore {
    /// Create a new file-based store at the given path.
    ///
    /// If the file exists, records are loaded from it. Corrupted lines are
    /// skipped with a warning. If the file does not exist, the store
    /// starts empty (file created on first write).
    pub fn new(path: PathBuf) -> Self {
        let values = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = values.len(), "File store loaded");
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    fn load_from_disk(path: &PathBuf) -> HashMap<String, serde_json::Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Record>(line) {
                Ok(record) => Some((record.key, record.value)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted store record");
                    None
                }
            })
            .collect()
    }

    /// Flush all records to disk as JSONL.
    async fn flush(&self) -> Result<(), StoreError> {
        let values = self.values.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Failed to create store directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for (key, value) in values.iter() {
            let line = serde_json::to_string(&Record {
                key: key.clone(),
                value: value.clone(),
            })
            .map_err(|e| StoreError::Storage(format!("Failed to serialize record: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write store file: {e}")))
    }
}

#[async_trait]
impl PersistenceStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        self.flush().await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let existed = self.values.write().await.remove(key).is_some();
        if existed {
            self.flush().await?;
        }
        Ok(existed)
    }
}
