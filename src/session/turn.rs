//! The per-turn stream orchestrator.
//!
//! Consumes the engine's event stream for one turn, drives every durable
//! side effect exactly once and in order, and re-emits the normalized output
//! stream. Runs as its own task so that storage writes already issued
//! complete even if the client disconnects mid-stream; output sends to a
//! dropped receiver are ignored.
//!
//! Write order for one turn, each at most once:
//! session-create (new sessions only) -> user-message append ->
//! assistant-message append -> session-metadata update (success only).
//! Each write is awaited before the next step, and the write establishing a
//! session completes before any output event referencing its id is emitted.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{EngineEventKind, EngineStream, TurnStats};
use crate::store::SessionStore;

use super::output::{OutputEvent, TurnSummary};
use super::resolve::Resolution;
use super::{MessageRecord, SessionRecord, TurnError};

/// Orchestrates one request/response cycle.
///
/// Owns all turn-scoped state: the accumulated assistant text, the
/// discovered session identifier, and whether this turn created its session.
pub struct TurnOrchestrator {
    store: Arc<dyn SessionStore>,
    resolution: Resolution,
    model: String,
    debug: bool,
}

/// Turn-scoped working state.
#[derive(Default)]
struct TurnState {
    session_id: Option<String>,
    accumulated: String,
    created_session: bool,
}

impl TurnOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        resolution: Resolution,
        model: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self {
            store,
            resolution,
            model: model.into(),
            debug,
        }
    }

    /// Run the turn to completion.
    ///
    /// The terminal `result`/`error` event is always the last one sent; no
    /// failure escapes this function once the stream has started.
    pub async fn run(
        self,
        user_message: String,
        events: EngineStream,
        out: mpsc::Sender<OutputEvent>,
    ) {
        if let Err(e) = self.drive(&user_message, events, &out).await {
            warn!(error = %e, "Turn failed");
            let details = self.debug.then(|| e.to_string());
            send(&out, OutputEvent::error(e.user_message(), details)).await;
        }
    }

    /// The state machine proper. Returns `Err` only for fatal conditions
    /// that have not yet produced a terminal output event.
    async fn drive(
        &self,
        user_message: &str,
        mut events: EngineStream,
        out: &mpsc::Sender<OutputEvent>,
    ) -> Result<(), TurnError> {
        let mut state = TurnState::default();

        while let Some(event) = events.next().await {
            let event = event?;

            // First identifier-bearing event: START -> IDENTIFIED. The
            // caller-supplied handle is not validated against the discovered
            // id; the discovered id wins everywhere.
            if state.session_id.is_none()
                && let Some(id) = event.session_id.clone()
            {
                state.created_session = self.establish(&id, user_message).await?;
                state.session_id = Some(id);
            }

            match event.kind {
                EngineEventKind::Init => {}

                EngineEventKind::Fragment(text) => {
                    state.accumulated.push_str(&text);
                    // A fragment before the engine reveals the session id is
                    // buffered but not emitted: content frames must carry an
                    // id whose metadata already exists.
                    if let Some(id) = &state.session_id {
                        send(out, OutputEvent::content(text, id.clone())).await;
                    }
                }

                EngineEventKind::Completed(stats) => {
                    return self.complete(&mut state, stats, out).await;
                }

                EngineEventKind::Failed { errors } => {
                    // Engine-reported failure: relayed verbatim, and the
                    // session's prior durable state is left untouched.
                    send(out, OutputEvent::error(errors.join("; "), None)).await;
                    return Ok(());
                }
            }
        }

        Err(TurnError::Engine(crate::engine::EngineError::Interrupted))
    }

    /// First-event bookkeeping: create the session record for new
    /// conversations, then append the user message. Completes before any
    /// output event referencing the id is emitted.
    async fn establish(&self, session_id: &str, user_message: &str) -> Result<bool, TurnError> {
        let created = if self.resolution.should_resume {
            false
        } else {
            self.store
                .create_session(&SessionRecord::new(session_id, self.model.clone()))
                .await?;
            true
        };

        self.store
            .append_message(session_id, &MessageRecord::user(user_message))
            .await?;

        debug!(
            session_id = %session_id,
            created = created,
            "Session established for turn"
        );
        Ok(created)
    }

    /// Terminal success: flush the buffered assistant text, update session
    /// metadata, and emit the result event - in that order, so durability
    /// and visibility of turn completion coincide.
    async fn complete(
        &self,
        state: &mut TurnState,
        stats: TurnStats,
        out: &mpsc::Sender<OutputEvent>,
    ) -> Result<(), TurnError> {
        let session_id = state
            .session_id
            .clone()
            .ok_or(TurnError::MissingSessionIdentifier)?;

        let streamed = !state.accumulated.is_empty();
        let content = if streamed {
            std::mem::take(&mut state.accumulated)
        } else {
            // Engines that stream nothing still report their final text.
            stats.final_text.clone().unwrap_or_default()
        };

        self.store
            .append_message(&session_id, &MessageRecord::assistant(content, streamed))
            .await?;

        self.store
            .update_session(
                &session_id,
                &super::SessionPatch {
                    is_active: false,
                    current_turn: stats.num_turns,
                    total_cost_usd: stats.total_cost_usd,
                    updated_at: Utc::now(),
                },
            )
            .await?;

        debug!(
            session_id = %session_id,
            created_session = state.created_session,
            num_turns = stats.num_turns,
            cost_usd = stats.total_cost_usd,
            "Turn completed"
        );

        send(
            out,
            OutputEvent::result(TurnSummary {
                session_id,
                total_cost_usd: stats.total_cost_usd,
                duration_ms: stats.duration_ms,
                num_turns: stats.num_turns,
            }),
        )
        .await;
        Ok(())
    }
}

/// Send one output event, ignoring a disconnected client.
async fn send(out: &mpsc::Sender<OutputEvent>, event: OutputEvent) {
    if out.send(event).await.is_err() {
        debug!("Client disconnected; dropping output event");
    }
}
