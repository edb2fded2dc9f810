//! Storage port for durable session state.
//!
//! The store is the single source of truth across turns: the orchestrator
//! holds per-turn state only in memory and issues at most four writes per
//! turn, each awaited before the next step proceeds.

mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use async_trait::async_trait;

use crate::session::{MessageRecord, SessionPatch, SessionRecord};

/// Storage interface for session metadata and message history.
///
/// Implementations must make sequential calls per session safe; concurrent
/// writes to distinct sessions may proceed independently. Callers guarantee
/// at most one in-flight turn per session, so no per-session write lock is
/// required here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session record.
    ///
    /// Called exactly once per session, when the engine first reveals the
    /// identifier for a turn that carried no resume handle.
    async fn create_session(&self, record: &SessionRecord) -> StorageResult<()>;

    /// Append one message to a session's history.
    ///
    /// Fails with `NotFound` if the session does not exist.
    async fn append_message(
        &self,
        session_id: &str,
        message: &MessageRecord,
    ) -> StorageResult<()>;

    /// Apply a metadata patch to a session record.
    ///
    /// Fails with `NotFound` if the session does not exist.
    async fn update_session(&self, session_id: &str, patch: &SessionPatch) -> StorageResult<()>;

    /// Load one session record, `Ok(None)` if absent.
    async fn get_session(&self, session_id: &str) -> StorageResult<Option<SessionRecord>>;

    /// List all known session records.
    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>>;

    /// Load a session's message history in append order.
    ///
    /// Fails with `NotFound` if the session does not exist.
    async fn get_messages(&self, session_id: &str) -> StorageResult<Vec<MessageRecord>>;
}
