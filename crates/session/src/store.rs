//! The Conversation Store — bounded, persisted sessions.
//!
//! Sessions are loaded from and written through a `PersistenceStore` on
//! every mutation. Retention is head+tail: when a session overflows, the
//! opening turns are kept (why the session started) alongside the most
//! recent turns, and the middle is silently dropped. Expired sessions are
//! replaced by a fresh empty session on next access, never resurrected.
//!
//! Mutations are serialized per session key: overlapping requests from the
//! same session cannot interleave or corrupt the turn sequence.

use crate::topics;
use chrono::Duration;
use genloom_core::error::StoreError;
use genloom_core::message::{ConversationSession, HistoryTurn, Role, Turn};
use genloom_core::store::PersistenceStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Retention settings for conversation sessions.
#[derive(Debug, Clone)]
pub struct Retention {
    /// Maximum turns kept per session.
    pub max_turns: usize,

    /// Opening turns always kept when trimming.
    pub head_retain: usize,

    /// Idle time after which a session expires.
    pub idle_timeout: Duration,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            max_turns: 50,
            head_retain: 10,
            idle_timeout: Duration::minutes(30),
        }
    }
}

/// A compact session summary, used when full history cannot fit a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Total turns currently retained
    pub turn_count: usize,

    /// Seconds since the session was created
    pub age_secs: i64,

    /// Derived topics, oldest first
    pub topics: Vec<String>,

    /// The most recent raw turns
    pub recent: Vec<HistoryTurn>,
}

/// How many raw turns a summary carries.
const SUMMARY_RECENT_TURNS: usize = 5;

/// The Conversation Store.
pub struct ConversationStore {
    store: Arc<dyn PersistenceStore>,
    retention: Retention,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationStore {
    /// Create a store over a persistence backend with the given retention.
    pub fn new(store: Arc<dyn PersistenceStore>, retention: Retention) -> Self {
        Self {
            store,
            retention,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn storage_key(session_key: &str) -> String {
        format!("session:{session_key}")
    }

    /// The per-key mutex serializing mutations for one session.
    async fn lock_for(&self, session_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the session for a key, replacing expired or corrupted state
    /// with a fresh empty session.
    async fn load(&self, session_key: &str) -> Result<ConversationSession, StoreError> {
        let stored = self.store.get(&Self::storage_key(session_key)).await?;

        let Some(value) = stored else {
            return Ok(ConversationSession::new());
        };

        let session: ConversationSession = match serde_json::from_value(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %session_key, error = %e, "Corrupted session state, starting fresh");
                return Ok(ConversationSession::new());
            }
        };

        if session.idle() > self.retention.idle_timeout {
            debug!(
                key = %session_key,
                idle_secs = session.idle().num_seconds(),
                "Session expired, starting fresh"
            );
            return Ok(ConversationSession::new());
        }

        Ok(session)
    }

    async fn persist(
        &self,
        session_key: &str,
        session: &ConversationSession,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(session)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize session: {e}")))?;
        self.store.set(&Self::storage_key(session_key), value).await
    }

    /// Trim overflow: first `head_retain` turns plus the most recent
    /// remainder, dropping the middle.
    fn trim(&self, session: &mut ConversationSession) {
        let max = self.retention.max_turns;
        if session.turns.len() <= max {
            return;
        }
        let head = self.retention.head_retain.min(max);
        let tail = max - head;
        let dropped = session.turns.len() - max;

        let tail_start = session.turns.len() - tail;
        let mut kept: Vec<Turn> = session.turns[..head].to_vec();
        kept.extend_from_slice(&session.turns[tail_start..]);
        session.turns = kept;

        debug!(
            session = %session.id,
            dropped = dropped,
            "Trimmed conversation overflow (head+tail retention)"
        );
    }

    /// Append a turn to a session, deriving topics and trimming overflow.
    pub async fn append(
        &self,
        session_key: &str,
        role: Role,
        content: &str,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<(), StoreError> {
        let lock = self.lock_for(session_key).await;
        let _guard = lock.lock().await;

        let mut session = self.load(session_key).await?;

        let mut turn = match role {
            Role::User => Turn::user(content),
            Role::Assistant => Turn::assistant(content),
        };
        if let Some(metadata) = metadata {
            turn.metadata = metadata;
        }
        session.push(turn);

        topics::merge_topics(&mut session.topics, content);
        self.trim(&mut session);

        self.persist(session_key, &session).await
    }

    /// Full turn history for a session.
    pub async fn history(&self, session_key: &str) -> Result<Vec<Turn>, StoreError> {
        Ok(self.load(session_key).await?.turns)
    }

    /// Minimal `{role, content}` projection of the most recent turns,
    /// bounded by `turn_limit`.
    pub async fn history_for_generation(
        &self,
        session_key: &str,
        turn_limit: usize,
    ) -> Result<Vec<HistoryTurn>, StoreError> {
        let session = self.load(session_key).await?;
        let skip = session.turns.len().saturating_sub(turn_limit);
        Ok(session.turns[skip..].iter().map(HistoryTurn::from).collect())
    }

    /// Compact summary for when full history cannot fit a budget.
    pub async fn summarize(&self, session_key: &str) -> Result<SessionSummary, StoreError> {
        let session = self.load(session_key).await?;
        let skip = session.turns.len().saturating_sub(SUMMARY_RECENT_TURNS);
        Ok(SessionSummary {
            turn_count: session.turns.len(),
            age_secs: session.age().num_seconds(),
            topics: session.topics.clone(),
            recent: session.turns[skip..].iter().map(HistoryTurn::from).collect(),
        })
    }

    /// Explicitly tear down a session.
    pub async fn reset(&self, session_key: &str) -> Result<(), StoreError> {
        let lock = self.lock_for(session_key).await;
        let _guard = lock.lock().await;
        self.store.remove(&Self::storage_key(session_key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    fn store_with(retention: Retention) -> ConversationStore {
        ConversationStore::new(Arc::new(MemoryStore::new()), retention)
    }

    #[tokio::test]
    async fn append_and_history() {
        let store = store_with(Retention::default());
        store
            .append("ws-1", Role::User, "create a button", None)
            .await
            .unwrap();
        store
            .append("ws-1", Role::Assistant, "here is a button", None)
            .await
            .unwrap();

        let turns = store.history("ws-1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_key() {
        let store = store_with(Retention::default());
        store.append("a", Role::User, "hello", None).await.unwrap();
        store.append("b", Role::User, "world", None).await.unwrap();

        assert_eq!(store.history("a").await.unwrap().len(), 1);
        assert_eq!(store.history("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn never_exceeds_max_turns() {
        let retention = Retention {
            max_turns: 12,
            head_retain: 4,
            ..Default::default()
        };
        let store = store_with(retention);

        for i in 0..30 {
            store
                .append("ws", Role::User, &format!("turn {i}"), None)
                .await
                .unwrap();
            assert!(store.history("ws").await.unwrap().len() <= 12);
        }
    }

    #[tokio::test]
    async fn overflow_keeps_head_and_tail() {
        let store = store_with(Retention::default());

        for i in 0..60 {
            store
                .append("ws", Role::User, &format!("turn {i}"), None)
                .await
                .unwrap();
        }

        let turns = store.history("ws").await.unwrap();
        assert_eq!(turns.len(), 50);

        // The original opening turns are still present...
        for i in 0..10 {
            assert_eq!(turns[i].content, format!("turn {i}"));
        }
        // ...alongside the most recent 40, with the middle dropped.
        assert_eq!(turns[10].content, "turn 20");
        assert_eq!(turns[49].content, "turn 59");
    }

    #[tokio::test]
    async fn expired_session_starts_fresh() {
        let retention = Retention {
            idle_timeout: Duration::milliseconds(50),
            ..Default::default()
        };
        let store = store_with(retention);

        store.append("ws", Role::User, "old message", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;

        // Next access sees a brand-new, empty session.
        assert!(store.history("ws").await.unwrap().is_empty());

        store.append("ws", Role::User, "new message", None).await.unwrap();
        let turns = store.history("ws").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "new message");
    }

    #[tokio::test]
    async fn topics_derived_from_appends() {
        let store = store_with(Retention::default());
        store
            .append("ws", Role::User, "I need a modal with a form", None)
            .await
            .unwrap();
        store
            .append("ws", Role::User, "add a button to the form", None)
            .await
            .unwrap();

        let summary = store.summarize("ws").await.unwrap();
        assert_eq!(summary.topics, vec!["form", "modal", "button"]);
    }

    #[tokio::test]
    async fn history_for_generation_projects_and_limits() {
        let store = store_with(Retention::default());
        for i in 0..8 {
            store
                .append("ws", Role::User, &format!("message {i}"), None)
                .await
                .unwrap();
        }

        let history = store.history_for_generation("ws", 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "message 5");
        assert_eq!(history[2].content, "message 7");
    }

    #[tokio::test]
    async fn summary_counts_and_recent() {
        let store = store_with(Retention::default());
        for i in 0..7 {
            store
                .append("ws", Role::User, &format!("m{i}"), None)
                .await
                .unwrap();
        }

        let summary = store.summarize("ws").await.unwrap();
        assert_eq!(summary.turn_count, 7);
        assert_eq!(summary.recent.len(), 5);
        assert_eq!(summary.recent[4].content, "m6");
        assert!(summary.age_secs >= 0);
    }

    #[tokio::test]
    async fn reset_tears_down() {
        let store = store_with(Retention::default());
        store.append("ws", Role::User, "hello", None).await.unwrap();
        store.reset("ws").await.unwrap();
        assert!(store.history("ws").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_preserved_on_turns() {
        let store = store_with(Retention::default());
        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), serde_json::json!("gpt-4o"));

        store
            .append("ws", Role::Assistant, "done", Some(metadata))
            .await
            .unwrap();

        let turns = store.history("ws").await.unwrap();
        assert_eq!(turns[0].metadata["model"], "gpt-4o");
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let store = Arc::new(store_with(Retention::default()));

        let mut handles = Vec::new();
        for task in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    store
                        .append("ws", Role::User, &format!("t{task}-{i}"), None)
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // All 20 turns landed, none lost to a racing read-modify-write.
        assert_eq!(store.history("ws").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn corrupted_state_starts_fresh() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set("session:ws", serde_json::json!("not a session"))
            .await
            .unwrap();

        let store = ConversationStore::new(backend, Retention::default());
        assert!(store.history("ws").await.unwrap().is_empty());
    }
}
