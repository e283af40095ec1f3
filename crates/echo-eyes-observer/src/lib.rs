//! Observer API server for Echo Eyes.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) over which observers receive the
//!   `init` handshake and a `frame` message per feed per tick, and may send
//!   `capture` requests answered with `captureAck`
//! - **REST endpoint** (`/api/feeds`) returning the static feed catalog
//! - **Liveness endpoints** (`/` and `/health`)
//!
//! # Architecture
//!
//! Observers are tracked by the [`SessionRegistry`], one bounded queue per
//! session. The emission scheduler publishes frames into the registry;
//! each socket task drains its own queue, so a slow or broken observer
//! never holds up the others or the tick loop.
//!
//! [`SessionRegistry`]: session::SessionRegistry

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod session;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use session::{Session, SessionRegistry};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
