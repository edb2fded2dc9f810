//! File-based session storage.
//!
//! Directory structure:
//! ```text
//! {sessions_dir}/
//!   {session_id}/
//!     session.yaml       # Atomic metadata snapshot
//!     messages.jsonl     # Append-only message history
//! ```
//!
//! The snapshot is written via a temp file and rename so readers never
//! observe a half-written record. Messages are appended one JSON line at a
//! time; malformed lines are skipped on read (crash recovery).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::session::{MessageRecord, SessionPatch, SessionRecord};
use crate::store::error::{StorageError, StorageResult};
use crate::store::SessionStore;

const SNAPSHOT_FILE: &str = "session.yaml";
const MESSAGES_FILE: &str = "messages.jsonl";

/// File-based implementation of `SessionStore`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    sessions_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a new file session store.
    ///
    /// The sessions directory is created when the first session is stored.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(session_id)
    }

    fn snapshot_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(SNAPSHOT_FILE)
    }

    fn messages_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(MESSAGES_FILE)
    }

    async fn ensure_session_dir(&self, session_id: &str) -> StorageResult<()> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::file_io(&dir, e))
    }

    /// Write the snapshot atomically: temp file in the same directory, then
    /// rename over the target.
    async fn write_snapshot(&self, record: &SessionRecord) -> StorageResult<()> {
        let path = self.snapshot_path(&record.id);
        let tmp = path.with_extension("yaml.tmp");

        let yaml = serde_saphyr::to_string(record)
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        fs::write(&tmp, yaml.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::file_io(&path, e))
    }

    async fn read_snapshot(&self, session_id: &str) -> StorageResult<Option<SessionRecord>> {
        let path = self.snapshot_path(session_id);
        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };
        let record = serde_saphyr::from_str(&contents)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        Ok(Some(record))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create_session(&self, record: &SessionRecord) -> StorageResult<()> {
        self.ensure_session_dir(&record.id).await?;
        self.write_snapshot(record).await
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &MessageRecord,
    ) -> StorageResult<()> {
        if self.read_snapshot(session_id).await?.is_none() {
            return Err(StorageError::not_found("session", session_id));
        }

        let path = self.messages_path(session_id);
        let mut line = serde_json::to_string(message)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::file_io(&path, e))
    }

    async fn update_session(&self, session_id: &str, patch: &SessionPatch) -> StorageResult<()> {
        let Some(mut record) = self.read_snapshot(session_id).await? else {
            return Err(StorageError::not_found("session", session_id));
        };
        record.apply(patch);
        self.write_snapshot(&record).await
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<SessionRecord>> {
        self.read_snapshot(session_id).await
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        let mut sessions = Vec::new();

        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&self.sessions_dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.sessions_dir, e))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // Directories without a readable snapshot are skipped, not fatal.
            if let Ok(Some(record)) = self.read_snapshot(&name).await {
                sessions.push(record);
            }
        }

        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn get_messages(&self, session_id: &str) -> StorageResult<Vec<MessageRecord>> {
        if self.read_snapshot(session_id).await?.is_none() {
            return Err(StorageError::not_found("session", session_id));
        }

        let path = self.messages_path(session_id);
        let file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut messages = Vec::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // Skip malformed lines (crash recovery)
            let Ok(message) = serde_json::from_str::<MessageRecord>(trimmed) else {
                continue;
            };
            messages.push(message);
        }

        Ok(messages)
    }
}

// ============================================================================
// Tests
// ============================================================================
