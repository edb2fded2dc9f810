//! Agent engine error types.

use thiserror::Error;

/// Errors from the agent engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be spawned.
    #[error("failed to launch agent engine: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while reading the engine's output stream.
    #[error("failed to read agent engine output: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// The engine process ended without a terminal result.
    #[error("agent engine exited unexpectedly ({status}): {detail}")]
    Exited { status: String, detail: String },

    /// The event stream ended without a terminal result.
    #[error("agent engine stream ended before a terminal result")]
    Interrupted,

    /// Fault injected by the transport or reported out of band.
    #[error("{message}")]
    Stream { message: String },
}

impl EngineError {
    pub fn spawn(source: std::io::Error) -> Self {
        Self::Spawn { source }
    }

    pub fn read(source: std::io::Error) -> Self {
        Self::Read { source }
    }

    pub fn exited(status: Option<i32>, detail: impl Into<String>) -> Self {
        let status = match status {
            Some(code) => format!("status {code}"),
            None => "killed by signal".to_string(),
        };
        Self::Exited {
            status,
            detail: detail.into(),
        }
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
