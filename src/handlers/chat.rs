//! The streaming chat endpoint.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::engine::TurnOptions;
use crate::server::AppState;
use crate::session::{TurnOrchestrator, resolve};

use super::error_response;

/// Inbound chat request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/v1/chat
///
/// Starts one turn: resolves new-vs-resume from the optional `sessionId`,
/// drives the agent engine, and streams normalized output frames back as
/// SSE (`data: <JSON>\n\n`). Frame payloads:
/// - `{"type":"content","data":"...","sessionId":"..."}`
/// - `{"type":"result","data":{"sessionId","totalCostUsd","durationMs","numTurns"}}`
/// - `{"type":"error","data":{"error","details"?}}`
///
/// The terminal `result`/`error` frame is always last. Validation and
/// configuration problems are rejected before the stream starts; after
/// that, every failure becomes a terminal `error` frame.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message is required");
    }
    if !state.engine_configured {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "agent engine credential is not configured",
        );
    }

    let resolution = resolve(req.session_id.as_deref());
    debug!(
        resume = resolution.should_resume,
        session_id = resolution.supplied_id.as_deref().unwrap_or("-"),
        "Starting chat turn"
    );

    let events = match state
        .engine
        .start_turn(
            &req.message,
            TurnOptions {
                resume: resolution.supplied_id.clone(),
            },
        )
        .await
    {
        Ok(events) => events,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to start agent engine: {e}"),
            );
        }
    };

    let orchestrator =
        TurnOrchestrator::new(state.store.clone(), resolution, state.model.as_str(), state.debug);

    // The orchestrator runs as its own task: storage writes already issued
    // complete even if the client goes away before the stream is closed.
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(orchestrator.run(req.message, events, tx));

    let frames = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.to_sse_event()));
    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(state.keep_alive_interval_seconds))
        .text("keep-alive");

    Sse::new(frames).keep_alive(keep_alive).into_response()
}
