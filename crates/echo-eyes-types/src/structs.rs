//! Catalog records and the per-tick frame event.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::FeedId;

/// Note attached to a frame when no anomaly fired on that tick.
pub const NORMAL_NOTE: &str = "normal";

/// Location reported for a feed that is absent from the feed catalog.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A simulated video source as listed in the feed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Feed {
    /// Stable feed identifier.
    pub id: FeedId,
    /// Human-readable camera location.
    pub location: String,
}

/// A descriptive anomaly record from the event catalog.
///
/// Any fields besides `desc` are kept as-is and broadcast with the
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnomalyEvent {
    /// Description shown to observers and copied into the frame note.
    pub desc: String,
    /// Remaining catalog fields (severity, type, ...), passed through
    /// untouched. Not reflected in the generated `TypeScript` type.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnomalyEvent {
    /// A record with only a description.
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Metadata block carried by every frame event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FrameMeta {
    /// Location of the feed, or [`UNKNOWN_LOCATION`].
    pub location: String,
    /// The anomaly description, or [`NORMAL_NOTE`].
    pub note: String,
}

/// One rendered frame for one feed on one tick.
///
/// Build with [`FrameEvent::normal`] or [`FrameEvent::anomalous`]; both
/// keep `event` present exactly when `anomaly` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FrameEvent {
    /// Feed that produced the frame.
    pub feed_id: FeedId,
    /// Tick timestamp in epoch milliseconds, shared by every frame of a tick.
    #[ts(type = "number")]
    pub timestamp: i64,
    /// Self-contained encoded frame (a data URL).
    pub data_payload: String,
    /// Whether this tick was classified anomalous for the feed.
    pub anomaly: bool,
    /// The selected catalog event, present iff `anomaly` is true.
    pub event: Option<AnomalyEvent>,
    /// Location and note.
    pub meta: FrameMeta,
}

impl FrameEvent {
    /// Build a frame for a tick with no anomaly.
    pub fn normal(feed_id: FeedId, timestamp: i64, data_payload: String, location: String) -> Self {
        Self {
            feed_id,
            timestamp,
            data_payload,
            anomaly: false,
            event: None,
            meta: FrameMeta {
                location,
                note: NORMAL_NOTE.to_owned(),
            },
        }
    }

    /// Build a frame for an anomalous tick. The note mirrors the event
    /// description.
    pub fn anomalous(
        feed_id: FeedId,
        timestamp: i64,
        data_payload: String,
        location: String,
        event: AnomalyEvent,
    ) -> Self {
        Self {
            feed_id,
            timestamp,
            data_payload,
            anomaly: true,
            meta: FrameMeta {
                location,
                note: event.desc.clone(),
            },
            event: Some(event),
        }
    }
}
