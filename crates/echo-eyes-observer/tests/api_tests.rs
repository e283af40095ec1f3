//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use echo_eyes_core::FeedCatalog;
use echo_eyes_observer::handlers::LIVENESS_MESSAGE;
use echo_eyes_observer::router::build_router;
use echo_eyes_observer::state::AppState;
use echo_eyes_types::{Feed, FeedId, FrameEvent, Handshake, ServerMessage};
use serde_json::Value;
use tower::ServiceExt;

fn make_feeds() -> Arc<FeedCatalog> {
    FeedCatalog::new(vec![
        Feed {
            id: FeedId(1),
            location: String::from("Lobby"),
        },
        Feed {
            id: FeedId(2),
            location: String::from("Loading Dock"),
        },
    ])
    .map(Arc::new)
    .unwrap()
}

fn make_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(make_feeds()))
}

async fn body_to_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_to_bytes(body).await).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_reports_liveness() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_bytes(response.into_body()).await;
    assert_eq!(body, LIVENESS_MESSAGE.as_bytes());
}

#[tokio::test]
async fn test_health() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_feeds_returns_full_catalog() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/api/feeds").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json,
        serde_json::json!({
            "feeds": [
                {"id": 1, "location": "Lobby"},
                {"id": 2, "location": "Loading Dock"},
            ]
        })
    );
}

#[tokio::test]
async fn test_list_feeds_with_empty_catalog() {
    let state = Arc::new(AppState::new(Arc::new(FeedCatalog::default())));
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/feeds").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["feeds"], serde_json::json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("/api/nope"));
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origin() {
    let state = Arc::new(
        AppState::new(make_feeds()).with_cors_origin(Some(String::from("https://dash.example"))),
    );
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/feeds")
                .header(header::ORIGIN, "https://dash.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://dash.example"
    );
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://elsewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_session_handshake_counts_catalog_feeds() {
    let state = make_test_state();
    let mut session = state.sessions.connect();

    let frame = FrameEvent::normal(FeedId(1), 0, String::new(), String::from("Lobby"));
    assert_eq!(state.sessions.broadcast(&frame), 1);

    assert_eq!(
        session.outbound.recv().await.unwrap(),
        ServerMessage::Init(Handshake { feed_count: 2 })
    );
    assert!(matches!(
        session.outbound.recv().await.unwrap(),
        ServerMessage::Frame(f) if f.feed_id == FeedId(1)
    ));
}
