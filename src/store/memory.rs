//! In-memory session storage.
//!
//! Backs tests and embedded deployments where durability across restarts is
//! not needed. Semantics match `FileSessionStore`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::session::{MessageRecord, SessionPatch, SessionRecord};
use crate::store::error::{StorageError, StorageResult};
use crate::store::SessionStore;

#[derive(Debug)]
struct Entry {
    record: SessionRecord,
    messages: Vec<MessageRecord>,
}

/// In-memory implementation of `SessionStore`.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, record: &SessionRecord) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        inner.insert(
            record.id.clone(),
            Entry {
                record: record.clone(),
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &MessageRecord,
    ) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .get_mut(session_id)
            .ok_or_else(|| StorageError::not_found("session", session_id))?;
        entry.messages.push(message.clone());
        Ok(())
    }

    async fn update_session(&self, session_id: &str, patch: &SessionPatch) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .get_mut(session_id)
            .ok_or_else(|| StorageError::not_found("session", session_id))?;
        entry.record.apply(patch);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<SessionRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.get(session_id).map(|e| e.record.clone()))
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<_> = inner.values().map(|e| e.record.clone()).collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn get_messages(&self, session_id: &str) -> StorageResult<Vec<MessageRecord>> {
        let inner = self.inner.read().await;
        let entry = inner
            .get(session_id)
            .ok_or_else(|| StorageError::not_found("session", session_id))?;
        Ok(entry.messages.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
