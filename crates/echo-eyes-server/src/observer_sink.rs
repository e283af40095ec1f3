//! Frame sink that feeds the Observer API.
//!
//! Bridges the emission scheduler to the observer session registry:
//! every frame the scheduler assembles is queued for all connected
//! `WebSocket` observers.

use std::sync::Arc;

use echo_eyes_core::FrameSink;
use echo_eyes_observer::AppState;
use echo_eyes_types::FrameEvent;
use tracing::trace;

/// Sink that broadcasts frames through the shared [`AppState`].
pub struct ObserverSink {
    state: Arc<AppState>,
}

impl ObserverSink {
    /// Create a sink backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl FrameSink for ObserverSink {
    fn publish(&self, frame: &FrameEvent) -> usize {
        let receivers = self.state.sessions.broadcast(frame);
        trace!(feed_id = %frame.feed_id, receivers, "Frame broadcast sent");
        receivers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use echo_eyes_core::FeedCatalog;
    use echo_eyes_types::{FeedId, ServerMessage};

    use super::*;

    #[test]
    fn publish_reaches_connected_sessions() {
        let state = Arc::new(AppState::new(Arc::new(FeedCatalog::default())));
        let sink = ObserverSink::new(Arc::clone(&state));
        let frame = FrameEvent::normal(FeedId(1), 0, String::new(), String::from("Unknown"));

        assert_eq!(sink.publish(&frame), 0);

        let mut session = state.sessions.connect();
        assert_eq!(sink.publish(&frame), 1);
        let _init = session.outbound.try_recv().unwrap();
        assert!(matches!(session.outbound.try_recv().unwrap(), ServerMessage::Frame(_)));
    }
}
