//! Normalized output events and their SSE encoding.
//!
//! Events are produced by the orchestrator, encoded to one wire frame each
//! (`data: <JSON>\n\n`), and discarded; they are never persisted.

use axum::response::sse::Event;
use serde::Serialize;

// ============================================================================
// Output Events
// ============================================================================

/// One event on the normalized output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputEvent {
    /// Incremental assistant text.
    Content {
        data: String,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    /// Terminal success metrics. Always the last event of a successful turn.
    Result { data: TurnSummary },
    /// Terminal failure. Always the last event of a failed turn.
    Error { data: ErrorBody },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSummary {
    pub session_id: String,
    pub total_cost_usd: f64,
    pub duration_ms: u64,
    pub num_turns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Raw diagnostic detail, attached only in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl OutputEvent {
    #[must_use]
    pub fn content(data: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::Content {
            data: data.into(),
            session_id: session_id.into(),
        }
    }

    #[must_use]
    pub fn result(summary: TurnSummary) -> Self {
        Self::Result { data: summary }
    }

    #[must_use]
    pub fn error(error: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            data: ErrorBody {
                error: error.into(),
                details,
            },
        }
    }

    /// True for `Result` and `Error`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }

    /// Encode to one SSE frame. Pure and stateless; our event types always
    /// serialize, so the fallback frame is unreachable in practice.
    #[must_use]
    pub fn to_sse_event(&self) -> Event {
        Event::default()
            .json_data(self)
            .unwrap_or_else(|_| Event::default().data("{}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
