//! Session read endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::session::{MessageRecord, SessionRecord};
use crate::store::StorageError;

use super::error_response;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub model: String,
    pub is_active: bool,
    pub current_turn: u32,
    pub total_cost_usd: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            session_id: record.id,
            model: record.model,
            is_active: record.is_active,
            current_turn: record.current_turn,
            total_cost_usd: record.total_cost_usd,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl From<MessageRecord> for MessageResponse {
    fn from(message: MessageRecord) -> Self {
        Self {
            id: message.id,
            role: message.role.to_string(),
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

#[derive(Deserialize)]
pub struct GetMessagesQuery {
    limit: Option<u32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Response {
    match state.store.list_sessions().await {
        Ok(sessions) => Json(ListSessionsResponse {
            sessions: sessions.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => storage_error(e),
    }
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.store.get_session(&session_id).await {
        Ok(Some(record)) => Json(SessionResponse::from(record)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "session not found"),
        Err(e) => storage_error(e),
    }
}

/// GET /api/v1/sessions/{session_id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<GetMessagesQuery>,
) -> Response {
    match state.store.get_messages(&session_id).await {
        Ok(messages) => {
            let iter = messages.into_iter().map(MessageResponse::from);
            let messages: Vec<_> = match query.limit {
                Some(limit) => iter.take(limit as usize).collect(),
                None => iter.collect(),
            };
            Json(GetMessagesResponse { messages }).into_response()
        }
        Err(e) => storage_error(e),
    }
}

fn storage_error(e: StorageError) -> Response {
    if e.is_not_found() {
        error_response(StatusCode::NOT_FOUND, "session not found")
    } else {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("storage failure: {e}"),
        )
    }
}
