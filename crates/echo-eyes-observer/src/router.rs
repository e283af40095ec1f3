//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing layers.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- liveness message
/// - `GET /health` -- JSON liveness indicator
/// - `GET /api/feeds` -- feed catalog
/// - `GET /ws` -- `WebSocket` observer session
///
/// CORS allows only the configured origin when one is set, otherwise any
/// origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.cors_origin.as_deref());

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/feeds", get(handlers::list_feeds))
        .route("/ws", get(ws::ws_observer))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST];
    match origin {
        None => CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(methods)
                .allow_headers(Any),
            Err(e) => {
                warn!(origin, error = %e, "Invalid CORS origin, cross-origin requests disabled");
                CorsLayer::new()
            }
        },
    }
}
