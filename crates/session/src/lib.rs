//! Conversation sessions for Genloom.
//!
//! The Conversation Store keeps a bounded, persisted sequence of turns per
//! session key. Overflow drops the middle of the conversation (the opening
//! turns and the most recent turns both survive), idle sessions expire
//! lazily on access, and per-key locking keeps overlapping requests from
//! corrupting the turn sequence.
//!
//! Persistence backends implementing `genloom_core::PersistenceStore`:
//! - [`MemoryStore`] — ephemeral, for tests and one-shot sessions
//! - [`FileStore`] — JSONL file, durable across restarts

pub mod file_store;
pub mod memory_store;
pub mod store;
pub mod topics;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use store::{ConversationStore, Retention, SessionSummary};
pub use topics::MAX_TOPICS;
