//! Wire format for the engine CLI's streaming JSON output.
//!
//! The engine emits one JSON object per stdout line. Lines we do not
//! recognize are ignored rather than treated as protocol errors - the engine
//! is opaque and adds event kinds over time.

use serde::Deserialize;

use super::{EngineEvent, EngineEventKind, TurnStats};

// ============================================================================
// Wire Types
// ============================================================================

/// One decoded stdout line. Fields are optional because different event kinds
/// populate different subsets.
#[derive(Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub content: Vec<WireContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct WireContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one stdout line into an engine event.
///
/// Returns `None` for blank, malformed, or unrecognized lines.
pub fn decode_line(line: &str) -> Option<EngineEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let wire: WireEvent = serde_json::from_str(trimmed).ok()?;
    wire.into_event()
}

impl WireEvent {
    fn into_event(self) -> Option<EngineEvent> {
        let kind = match self.kind.as_str() {
            "system" => EngineEventKind::Init,
            "assistant" => {
                let text = self
                    .message
                    .map(|m| {
                        m.content
                            .into_iter()
                            .filter(|b| b.kind == "text")
                            .filter_map(|b| b.text)
                            .collect::<String>()
                    })
                    .unwrap_or_default();
                if text.is_empty() {
                    // Tool-use-only turns still carry the session id.
                    EngineEventKind::Init
                } else {
                    EngineEventKind::Fragment(text)
                }
            }
            "result" => {
                let failed = self.is_error.unwrap_or(false)
                    || self
                        .subtype
                        .as_deref()
                        .is_some_and(|s| s.starts_with("error"));
                if failed {
                    let errors = match self.errors {
                        Some(errors) if !errors.is_empty() => errors,
                        _ => vec![self
                            .result
                            .or(self.subtype)
                            .unwrap_or_else(|| "engine reported an error".to_string())],
                    };
                    EngineEventKind::Failed { errors }
                } else {
                    EngineEventKind::Completed(TurnStats {
                        total_cost_usd: self.total_cost_usd.unwrap_or(0.0),
                        duration_ms: self.duration_ms.unwrap_or(0),
                        num_turns: self.num_turns.unwrap_or(0),
                        final_text: self.result,
                    })
                }
            }
            _ => return None,
        };

        Some(EngineEvent {
            session_id: self.session_id,
            kind,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
