//! REST endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Plain-text liveness message |
//! | `GET` | `/health` | JSON liveness indicator |
//! | `GET` | `/api/feeds` | The full feed catalog |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use axum::response::IntoResponse;

use crate::error::ObserverError;
use crate::state::AppState;

/// Body of `GET /`.
pub const LIVENESS_MESSAGE: &str = "Echo Eyes backend is running";

/// `GET /` -- report that the process is up.
pub async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

/// `GET /health` -- fixed success indicator.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /api/feeds` -- the feed catalog for client bootstrap. No
/// pagination or filtering.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let feeds = serde_json::to_value(state.feeds.feeds())?;
    Ok(Json(serde_json::json!({ "feeds": feeds })))
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ObserverError {
    ObserverError::NotFound(uri.path().to_owned())
}
