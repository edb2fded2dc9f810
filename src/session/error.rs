//! Turn-level error taxonomy and user-facing sanitization.

use thiserror::Error;

use crate::engine::EngineError;
use crate::store::StorageError;

/// Substrings in engine faults that indicate an invalid or expired resume
/// target rather than a transient failure.
const EXPIRED_SESSION_MARKERS: &[&str] = &[
    "no conversation found",
    "session not found",
    "invalid session",
];

/// Message shown when a resume target no longer exists on the engine side.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Session expired or not found. Please start a new conversation.";

/// Fatal conditions for one turn.
///
/// Engine-reported failures are not represented here: they arrive as a
/// regular terminal event and are relayed verbatim.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Terminal success arrived but no event ever carried a session id.
    #[error("turn completed without the engine assigning a session identifier")]
    MissingSessionIdentifier,

    /// A durable write failed mid-turn.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Transport or engine process fault.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl TurnError {
    /// The sanitized message put on the wire. Raw detail goes into the
    /// error frame's `details` field only when debug mode is on.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingSessionIdentifier => self.to_string(),
            Self::Storage(_) => "Failed to persist conversation state.".to_string(),
            Self::Engine(e) => {
                let raw = e.to_string().to_lowercase();
                if EXPIRED_SESSION_MARKERS.iter().any(|m| raw.contains(m)) {
                    SESSION_EXPIRED_MESSAGE.to_string()
                } else {
                    "Agent engine stream failed.".to_string()
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
