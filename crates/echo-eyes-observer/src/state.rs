//! Shared application state for the Observer API server.

use std::sync::Arc;

use echo_eyes_core::FeedCatalog;
use tokio_util::sync::CancellationToken;

use crate::session::SessionRegistry;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// same value is handed to the emission scheduler's sink so broadcasts
/// and socket handlers see one session registry.
#[derive(Debug)]
pub struct AppState {
    /// Connected observers.
    pub sessions: SessionRegistry,
    /// The static feed catalog served by `GET /api/feeds`.
    pub feeds: Arc<FeedCatalog>,
    /// Allowed CORS origin; any origin when `None`.
    pub cors_origin: Option<String>,
    /// Fired on shutdown; open sockets close when it triggers.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state for the given feed catalog with a fresh shutdown token.
    pub fn new(feeds: Arc<FeedCatalog>) -> Self {
        Self::with_shutdown(feeds, CancellationToken::new())
    }

    /// Create state sharing an existing shutdown token.
    pub fn with_shutdown(feeds: Arc<FeedCatalog>, shutdown: CancellationToken) -> Self {
        Self {
            sessions: SessionRegistry::new(feeds.feed_count()),
            feeds,
            cors_origin: None,
            shutdown,
        }
    }

    /// Restrict CORS to a single origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }
}
