//! Project-context snapshot cache.
//!
//! Keyed by workspace plus a coarse one-minute time bucket, so repeated
//! generations within the same minute reuse one analysis pass. The cache
//! is stale-while-revalidate: a cached value is served on hit, refresh
//! happens only on a key miss, never on a background timer. Capped with
//! oldest-entry eviction.

use chrono::{DateTime, Utc};
use genloom_core::analyzer::ProjectContext;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Maximum cached snapshots.
const MAX_ENTRIES: usize = 10;

struct Inner {
    entries: HashMap<String, ProjectContext>,
    order: VecDeque<String>,
}

/// The snapshot cache. Concurrent reads are cheap; inserts take the
/// write lock briefly.
pub struct ContextCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Cache key: workspace + one-minute time bucket.
    pub fn bucket_key(workspace: &str, now: DateTime<Utc>) -> String {
        format!("{workspace}:{}", now.timestamp() / 60)
    }

    pub async fn get(&self, key: &str) -> Option<ProjectContext> {
        self.inner.read().await.entries.get(key).cloned()
    }

    pub async fn insert(&self, key: String, context: ProjectContext) {
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, context);
            return;
        }
        while inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, context);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}
