//! Application state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

use crate::engine::AgentEngine;
use crate::handlers;
use crate::store::SessionStore;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub engine: Arc<dyn AgentEngine>,
    /// Whether the engine credential was resolved at startup. Checked before
    /// any stream starts so a misconfigured server fails with a plain 500.
    pub engine_configured: bool,
    /// Model descriptor stamped onto newly created sessions.
    pub model: String,
    /// Attach raw diagnostics to error frames.
    pub debug: bool,
    pub keep_alive_interval_seconds: u64,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    // The chat stream carries no request timeout; a non-terminating engine
    // stream holds the turn open.
    let streaming_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{session_id}", get(handlers::get_session))
        .route(
            "/sessions/{session_id}/messages",
            get(handlers::get_messages),
        )
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )));

    let api_v1 = Router::new().merge(streaming_routes).merge(api_routes);

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .nest("/api/v1", api_v1)
}
