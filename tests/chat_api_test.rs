//! Integration tests for the HTTP surface: the streaming chat endpoint and
//! the session read endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;

use colloquy::engine::TurnStats;
use colloquy::session::{MessageRecord, Role, SessionRecord};
use colloquy::store::{MemorySessionStore, SessionStore};

mod common;
use common::{
    ScriptedEngine, completed, failed, fragment, init, parse_frames, test_app, test_state,
};

fn chat_request(body: &str) -> Request<Body> {
    Request::post("/api/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn success_stats() -> TurnStats {
    TurnStats {
        total_cost_usd: 0.01,
        duration_ms: 120,
        num_turns: 1,
        final_text: Some("Hello".to_string()),
    }
}

// ============================================================================
// Streaming Chat
// ============================================================================

#[tokio::test]
async fn chat_streams_content_then_result() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        init("s1"),
        fragment("s1", "Hel"),
        fragment("s1", "lo"),
        completed("s1", success_stats()),
    ]));
    let store = Arc::new(MemorySessionStore::new());
    let app = test_app(test_state(engine.clone(), store.clone(), true));

    let response = app.oneshot(chat_request(r#"{"message":"hi"}"#)).await.unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let frames = parse_frames(std::str::from_utf8(&body).unwrap());

    assert_eq!(frames.len(), 3);
    assert_eq!(
        frames[0],
        serde_json::json!({"type":"content","data":"Hel","sessionId":"s1"})
    );
    assert_eq!(
        frames[1],
        serde_json::json!({"type":"content","data":"lo","sessionId":"s1"})
    );
    assert_eq!(
        frames[2],
        serde_json::json!({"type":"result","data":{
            "sessionId":"s1","totalCostUsd":0.01,"durationMs":120,"numTurns":1
        }})
    );

    // No resume handle was forwarded to the engine.
    assert_eq!(engine.calls.lock().unwrap()[0].resume, None);

    // Both sides of the exchange are durable.
    let record = store.get_session("s1").await.unwrap().unwrap();
    assert!(!record.is_active);
    assert_eq!(record.current_turn, 1);
    let messages = store.get_messages("s1").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hi");
    assert_eq!(messages[1].content, "Hello");
}

#[tokio::test]
async fn chat_with_session_id_resumes() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        init("s1"),
        completed(
            "s1",
            TurnStats {
                total_cost_usd: 0.02,
                duration_ms: 80,
                num_turns: 2,
                final_text: Some("ok".to_string()),
            },
        ),
    ]));
    let store = Arc::new(MemorySessionStore::new());
    store
        .create_session(&SessionRecord::new("s1", "test-model"))
        .await
        .unwrap();
    store
        .append_message("s1", &MessageRecord::user("earlier"))
        .await
        .unwrap();

    let app = test_app(test_state(engine.clone(), store.clone(), true));
    let response = app
        .oneshot(chat_request(r#"{"message":"hi","sessionId":"s1"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let frames = parse_frames(std::str::from_utf8(&body).unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "result");

    // The handle was forwarded to the engine as the resume target.
    assert_eq!(
        engine.calls.lock().unwrap()[0].resume.as_deref(),
        Some("s1")
    );

    // History grew by one user and one assistant message.
    let messages = store.get_messages("s1").await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "ok");
}

#[tokio::test]
async fn chat_engine_failure_yields_single_error_frame() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        init("s1"),
        failed("s1", &["rate limited"]),
    ]));
    let store = Arc::new(MemorySessionStore::new());
    let app = test_app(test_state(engine, store, true));

    let response = app.oneshot(chat_request(r#"{"message":"hi"}"#)).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let frames = parse_frames(std::str::from_utf8(&body).unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0],
        serde_json::json!({"type":"error","data":{"error":"rate limited"}})
    );
}

// ============================================================================
// Pre-Stream Rejections
// ============================================================================

#[tokio::test]
async fn chat_missing_message_is_400() {
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let store = Arc::new(MemorySessionStore::new());
    let app = test_app(test_state(engine, store, true));

    for body in [r#"{}"#, r#"{"message":""}"#, r#"{"message":"   "}"#] {
        let response = app.clone().oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), 400, "body: {body}");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "message is required");
    }
}

#[tokio::test]
async fn chat_without_credential_is_500() {
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let store = Arc::new(MemorySessionStore::new());
    let app = test_app(test_state(engine, store, false));

    let response = app.oneshot(chat_request(r#"{"message":"hi"}"#)).await.unwrap();
    assert_eq!(response.status(), 500);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].as_str().unwrap().contains("credential"));
}

// ============================================================================
// Session Read Endpoints
// ============================================================================

#[tokio::test]
async fn get_session_round_trip_and_404() {
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let store = Arc::new(MemorySessionStore::new());
    store
        .create_session(&SessionRecord::new("s1", "test-model"))
        .await
        .unwrap();
    let app = test_app(test_state(engine, store, true));

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/v1/sessions/s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["session_id"], "s1");
    assert_eq!(json["model"], "test-model");
    assert_eq!(json["is_active"], true);

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "session not found");
}

#[tokio::test]
async fn list_sessions_and_messages_with_limit() {
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let store = Arc::new(MemorySessionStore::new());
    store
        .create_session(&SessionRecord::new("s1", "test-model"))
        .await
        .unwrap();
    store
        .append_message("s1", &MessageRecord::user("one"))
        .await
        .unwrap();
    store
        .append_message("s1", &MessageRecord::assistant("two", false))
        .await
        .unwrap();
    let app = test_app(test_state(engine, store, true));

    let response = app
        .clone()
        .oneshot(Request::get("/api/v1/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["sessions"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/s1/messages?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "one");
    assert_eq!(messages[0]["role"], "user");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_and_version_probes() {
    let engine = Arc::new(ScriptedEngine::new(vec![]));
    let store = Arc::new(MemorySessionStore::new());
    let app = test_app(test_state(engine, store, true));

    for path in ["/livez", "/readyz"] {
        let response = app
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = app
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["version"].is_string());
}
