//! Agent port: the narrow contract around the opaque generative-agent engine.
//!
//! The engine accepts a prompt plus options (including an optional resume
//! handle), assigns the session identifier, and yields an ordered sequence of
//! structured events terminating in a success or failure result.

pub mod claude;
mod error;
pub mod wire;

pub use claude::ClaudeEngine;
pub use error::EngineError;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

// ============================================================================
// Events
// ============================================================================

/// One event yielded by the engine during a turn.
///
/// Any event may carry the session identifier; the first one that does is the
/// single source of truth for the turn's session identity.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub session_id: Option<String>,
    pub kind: EngineEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Identifier-bearing event with no content (engine initialization).
    Init,
    /// One incremental piece of assistant text.
    Fragment(String),
    /// Terminal success with turn metrics.
    Completed(TurnStats),
    /// Terminal failure reported by the engine.
    Failed { errors: Vec<String> },
}

impl EngineEvent {
    #[must_use]
    pub fn init(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            kind: EngineEventKind::Init,
        }
    }

    #[must_use]
    pub fn fragment(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            kind: EngineEventKind::Fragment(text.into()),
        }
    }

    /// True for `Completed` and `Failed` events.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EngineEventKind::Completed(_) | EngineEventKind::Failed { .. }
        )
    }
}

/// Metrics carried by a terminal success event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnStats {
    pub total_cost_usd: f64,
    pub duration_ms: u64,
    pub num_turns: u32,
    /// The engine's own final text; used when no fragments were streamed.
    pub final_text: Option<String>,
}

// ============================================================================
// AgentEngine Trait
// ============================================================================

/// Options for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Session identifier to resume, if the caller supplied one.
    pub resume: Option<String>,
}

/// Ordered event stream for one turn.
pub type EngineStream = Pin<Box<dyn Stream<Item = Result<EngineEvent, EngineError>> + Send>>;

/// Contract for the generative-agent engine.
#[async_trait]
pub trait AgentEngine: Send + Sync {
    /// Start one turn and return its event stream.
    ///
    /// Errors here are pre-stream (the engine could not be started at all);
    /// everything after that arrives as stream items.
    async fn start_turn(
        &self,
        prompt: &str,
        options: TurnOptions,
    ) -> Result<EngineStream, EngineError>;
}
