#![allow(dead_code)]
//! Common test utilities.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use futures::stream;

use colloquy::engine::{
    AgentEngine, EngineError, EngineEvent, EngineEventKind, EngineStream, TurnOptions, TurnStats,
};
use colloquy::server::{self, AppState};
use colloquy::session::{MessageRecord, Role, SessionPatch, SessionRecord};
use colloquy::store::{MemorySessionStore, SessionStore, StorageResult};

// ============================================================================
// Scripted Engine
// ============================================================================

/// One scripted stream item.
#[derive(Debug, Clone)]
pub enum ScriptItem {
    Event(EngineEvent),
    Fault(&'static str),
}

/// Engine that replays a fixed script for every turn.
pub struct ScriptedEngine {
    script: Vec<ScriptItem>,
    /// Options seen by each `start_turn` call.
    pub calls: Mutex<Vec<TurnOptions>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptItem>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AgentEngine for ScriptedEngine {
    async fn start_turn(
        &self,
        _prompt: &str,
        options: TurnOptions,
    ) -> Result<EngineStream, EngineError> {
        self.calls.lock().unwrap().push(options);
        let items: Vec<Result<EngineEvent, EngineError>> = self
            .script
            .iter()
            .cloned()
            .map(|item| match item {
                ScriptItem::Event(event) => Ok(event),
                ScriptItem::Fault(message) => Err(EngineError::stream(message)),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

// Script building helpers.

pub fn init(session_id: &str) -> ScriptItem {
    ScriptItem::Event(EngineEvent::init(session_id))
}

pub fn fragment(session_id: &str, text: &str) -> ScriptItem {
    ScriptItem::Event(EngineEvent::fragment(session_id, text))
}

pub fn completed(session_id: &str, stats: TurnStats) -> ScriptItem {
    ScriptItem::Event(EngineEvent {
        session_id: Some(session_id.to_string()),
        kind: EngineEventKind::Completed(stats),
    })
}

pub fn failed(session_id: &str, errors: &[&str]) -> ScriptItem {
    ScriptItem::Event(EngineEvent {
        session_id: Some(session_id.to_string()),
        kind: EngineEventKind::Failed {
            errors: errors.iter().map(|s| s.to_string()).collect(),
        },
    })
}

// ============================================================================
// Recording Store
// ============================================================================

/// One observed storage write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Create(String),
    Append(String, Role),
    Update(String),
}

/// Store wrapper that records every write in order.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: MemorySessionStore,
    ops: Arc<Mutex<Vec<StoreOp>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn create_session(&self, record: &SessionRecord) -> StorageResult<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Create(record.id.clone()));
        self.inner.create_session(record).await
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &MessageRecord,
    ) -> StorageResult<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Append(session_id.to_string(), message.role));
        self.inner.append_message(session_id, message).await
    }

    async fn update_session(&self, session_id: &str, patch: &SessionPatch) -> StorageResult<()> {
        self.ops
            .lock()
            .unwrap()
            .push(StoreOp::Update(session_id.to_string()));
        self.inner.update_session(session_id, patch).await
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<SessionRecord>> {
        self.inner.get_session(session_id).await
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionRecord>> {
        self.inner.list_sessions().await
    }

    async fn get_messages(&self, session_id: &str) -> StorageResult<Vec<MessageRecord>> {
        self.inner.get_messages(session_id).await
    }
}

// ============================================================================
// App Builders
// ============================================================================

pub fn test_state(
    engine: Arc<dyn AgentEngine>,
    store: Arc<dyn SessionStore>,
    engine_configured: bool,
) -> AppState {
    AppState {
        store,
        engine,
        engine_configured,
        model: "test-model".to_string(),
        debug: false,
        keep_alive_interval_seconds: 15,
    }
}

pub fn test_app(state: AppState) -> Router {
    server::build_app(state, 300)
}

// ============================================================================
// SSE Parsing
// ============================================================================

/// Parse the JSON payloads out of an SSE body (`data: <JSON>\n\n` frames),
/// skipping comments and keep-alives.
pub fn parse_frames(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .filter_map(|data| serde_json::from_str(data).ok())
        .collect()
}
