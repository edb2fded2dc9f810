//! Session domain types and the per-turn streaming machinery.
//!
//! A session's identifier is minted by the agent engine, never by this
//! process. Records are created exactly once, on the first engine event that
//! reveals the identifier, and updated at most once per turn on terminal
//! success.

mod error;
pub mod output;
pub mod resolve;
pub mod turn;

pub use error::TurnError;
pub use output::{ErrorBody, OutputEvent, TurnSummary};
pub use resolve::{Resolution, resolve};
pub use turn::TurnOrchestrator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Prefix for generated message identifiers.
pub const MESSAGE_ID_PREFIX: &str = "msg_";

// ============================================================================
// SessionRecord
// ============================================================================

/// Durable metadata for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Identifier assigned by the agent engine. Immutable once assigned.
    pub id: String,
    /// Model descriptor fixed at creation.
    pub model: String,
    /// True from creation until the turn's terminal result arrives.
    pub is_active: bool,
    /// Cumulative turn count reported by the engine.
    pub current_turn: u32,
    /// Cumulative cost reported by the engine.
    pub total_cost_usd: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A freshly created session: active, zero turns, zero cost.
    #[must_use]
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            model: model.into(),
            is_active: true,
            current_turn: 0,
            total_cost_usd: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a terminal-success patch to this record.
    pub fn apply(&mut self, patch: &SessionPatch) {
        self.is_active = patch.is_active;
        self.current_turn = patch.current_turn;
        self.total_cost_usd = patch.total_cost_usd;
        self.updated_at = patch.updated_at;
    }
}

/// Metadata update written once per successful turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub is_active: bool,
    pub current_turn: u32,
    pub total_cost_usd: f64,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// MessageRecord
// ============================================================================

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        write!(f, "{s}")
    }
}

/// One exchange unit in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Whether the content arrived as incremental fragments.
    #[serde(default)]
    pub streamed: bool,
}

impl MessageRecord {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>, streamed: bool) -> Self {
        Self {
            id: format!("{}{}", MESSAGE_ID_PREFIX, Ulid::new()),
            role,
            content: content.into(),
            created_at: Utc::now(),
            streamed,
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, streamed: bool) -> Self {
        Self::new(Role::Assistant, content, streamed)
    }
}

// ============================================================================
// Tests
// ============================================================================
