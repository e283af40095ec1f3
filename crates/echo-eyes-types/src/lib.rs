//! Shared type definitions for Echo Eyes.
//!
//! Everything that crosses the observer push channel or the REST surface
//! is defined here. Types flow downstream to `TypeScript` via `ts-rs` for
//! the observer dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Feed and session identifiers
//! - [`structs`] -- Catalog records and the per-tick [`FrameEvent`]
//! - [`messages`] -- Push-channel envelopes in both directions

pub mod ids;
pub mod messages;
pub mod structs;

pub use ids::{FeedId, SessionId};
pub use messages::{
    CaptureAck, CaptureMeta, CaptureRequest, ClientMessage, Handshake, ServerMessage,
};
pub use structs::{AnomalyEvent, Feed, FrameEvent, FrameMeta, NORMAL_NOTE, UNKNOWN_LOCATION};
