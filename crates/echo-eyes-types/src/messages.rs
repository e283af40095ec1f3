//! Push-channel message envelopes.
//!
//! Every message on the observer socket is a JSON object of the form
//! `{"type": "<event>", "data": {...}}`. Server-to-observer events are
//! `init`, `frame` and `captureAck`; the only observer-to-server event is
//! `capture`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::FeedId;
use crate::structs::FrameEvent;

/// One-time handshake sent on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Handshake {
    /// Total number of feeds in the catalog.
    pub feed_count: u32,
}

/// Optional metadata an observer attaches to a capture request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CaptureMeta {
    /// Free-form note about the captured frame.
    #[serde(default)]
    pub note: Option<String>,
}

/// Evidence capture request from an observer.
///
/// Both fields are optional on the wire: requests are acknowledged
/// whatever their shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaptureRequest {
    /// Feed the observer wants to capture.
    #[serde(default)]
    pub feed_id: Option<FeedId>,
    /// Optional metadata.
    #[serde(default)]
    pub meta: Option<CaptureMeta>,
}

impl CaptureRequest {
    /// The note attached to the request, if any.
    pub fn note(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.note.as_deref())
    }
}

/// Acknowledgement of a capture request, sent to the requester only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CaptureAck {
    /// Success flag (always true).
    pub ok: bool,
    /// Server time of the acknowledgement in epoch milliseconds.
    #[ts(type = "number")]
    pub saved_at: i64,
}

/// Messages the server pushes to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Handshake, always the first message on a connection.
    Init(Handshake),
    /// A frame for one feed on one tick.
    Frame(Box<FrameEvent>),
    /// Acknowledgement of a capture request.
    CaptureAck(CaptureAck),
}

/// Messages observers send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Evidence capture request.
    Capture(CaptureRequest),
}

impl ClientMessage {
    /// Parse an inbound text frame.
    ///
    /// Returns `None` for text that is not JSON or names an unknown event.
    /// A `capture` event is accepted with any payload shape; payloads that
    /// do not match [`CaptureRequest`] degrade to an empty request.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("capture") => {
                let request = value
                    .get("data")
                    .cloned()
                    .and_then(|data| serde_json::from_value(data).ok())
                    .unwrap_or_default();
                Some(Self::Capture(request))
            }
            _ => None,
        }
    }
}
