//! Observer server startup helper.
//!
//! Provides [`spawn_observer`] which binds the listener eagerly and then
//! runs the Observer HTTP + `WebSocket` server on a background Tokio task,
//! so the emission scheduler can run alongside it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use echo_eyes_observer::server::ServerConfig;
//! use echo_eyes_observer::startup::spawn_observer;
//!
//! let handle = spawn_observer(&ServerConfig::default(), Arc::clone(&state)).await?;
//! // ... later, after firing state.shutdown:
//! handle.await?;
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind the Observer server and serve it on a background Tokio task.
///
/// The task ends when the state's shutdown token fires.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound. Binding happens before the task is spawned.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = crate::server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(port = config.port, "Observer server spawned on background task");

    Ok(handle)
}
