//! Identifier types.
//!
//! Feeds are addressed by a small stable integer that the feed catalog
//! assigns (1-based). Observer sessions get an opaque UUID v7 that never
//! leaves the server except in log lines.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable, 1-based identifier of a simulated video feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct FeedId(pub u32);

impl FeedId {
    /// Return the raw integer value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for FeedId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FeedId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Opaque identity of a connected observer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new session identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn feed_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&FeedId(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
