//! Observer session registry.
//!
//! Each connected observer owns a bounded outbound queue. The registry
//! holds the sending half of every queue and is the only place frames
//! and handshakes are enqueued:
//!
//! - [`SessionRegistry::connect`] enqueues the `init` handshake before the
//!   session becomes visible to broadcasts, so it is always the first
//!   message an observer sees.
//! - [`SessionRegistry::broadcast`] tries every queue independently. A
//!   full queue drops the frame for that observer only; a closed queue is
//!   pruned. Neither affects the other observers or the caller.
//! - [`SessionRegistry::handle_capture`] builds the acknowledgement for the
//!   requester. It never goes through the queue, so a backed-up observer
//!   still gets its `captureAck`; the socket handler writes it directly.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use echo_eyes_types::{
    CaptureAck, CaptureRequest, FrameEvent, Handshake, ServerMessage, SessionId,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};

/// Capacity of each observer's outbound queue.
///
/// An observer that falls this many messages behind starts losing frames
/// until it catches up.
pub const SESSION_QUEUE_CAPACITY: usize = 64;

/// A freshly connected session: its identity and the receiving half of
/// its outbound queue.
#[derive(Debug)]
pub struct Session {
    /// Opaque session identity.
    pub id: SessionId,
    /// Messages queued for this observer, handshake first.
    pub outbound: mpsc::Receiver<ServerMessage>,
}

/// Registry of connected observers.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<BTreeMap<SessionId, mpsc::Sender<ServerMessage>>>,
    feed_count: u32,
}

impl SessionRegistry {
    /// Create an empty registry whose handshake reports `feed_count`.
    pub const fn new(feed_count: u32) -> Self {
        Self {
            sessions: Mutex::new(BTreeMap::new()),
            feed_count,
        }
    }

    /// Feed count reported in handshakes.
    pub const fn feed_count(&self) -> u32 {
        self.feed_count
    }

    /// Register a new observer and queue its handshake.
    pub fn connect(&self) -> Session {
        let id = SessionId::new();
        let (tx, outbound) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let handshake = ServerMessage::Init(Handshake {
            feed_count: self.feed_count,
        });
        if tx.try_send(handshake).is_err() {
            debug!(session = %id, "Handshake could not be queued");
        }
        self.lock().insert(id, tx);
        Session { id, outbound }
    }

    /// Forget an observer. Returns whether it was registered.
    pub fn disconnect(&self, id: SessionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Number of connected observers.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Queue a frame for every connected observer. Returns how many
    /// queues accepted it.
    pub fn broadcast(&self, frame: &FrameEvent) -> usize {
        let message = ServerMessage::Frame(Box::new(frame.clone()));
        let mut sessions = self.lock();
        let mut delivered = 0_usize;
        let mut closed = Vec::new();

        for (id, tx) in sessions.iter() {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    debug!(
                        session = %id,
                        feed_id = %frame.feed_id,
                        "Observer queue full, frame dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            sessions.remove(&id);
            debug!(session = %id, "Pruned closed observer session");
        }

        delivered
    }

    /// Acknowledge a capture request from observer `id`.
    ///
    /// The request is not validated and nothing is stored; the returned
    /// acknowledgement is always successful. The caller delivers it to the
    /// requester; nothing is queued here.
    pub fn handle_capture(&self, id: SessionId, request: &CaptureRequest) -> CaptureAck {
        info!(
            session = %id,
            feed_id = ?request.feed_id.map(|f| f.get()),
            note = request.note(),
            "Capture received"
        );
        if !self.lock().contains_key(&id) {
            debug!(session = %id, "Capture from a session that is no longer registered");
        }

        CaptureAck {
            ok: true,
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, mpsc::Sender<ServerMessage>>> {
        // The map stays consistent even if a holder panicked.
        self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use echo_eyes_types::FeedId;

    use super::*;

    fn frame(id: u32) -> FrameEvent {
        FrameEvent::normal(FeedId(id), 1, String::from("data:"), String::from("Lobby"))
    }

    #[test]
    fn handshake_is_first_message_and_reports_feed_count() {
        let registry = SessionRegistry::new(5);
        let mut session = registry.connect();
        registry.broadcast(&frame(1));

        assert_eq!(
            session.outbound.try_recv().unwrap(),
            ServerMessage::Init(Handshake { feed_count: 5 })
        );
        assert!(matches!(session.outbound.try_recv().unwrap(), ServerMessage::Frame(_)));
        assert!(session.outbound.try_recv().is_err());
    }

    #[test]
    fn broadcast_reaches_every_session() {
        let registry = SessionRegistry::new(2);
        let mut a = registry.connect();
        let mut b = registry.connect();
        assert_eq!(registry.broadcast(&frame(2)), 2);

        for session in [&mut a, &mut b] {
            let _init = session.outbound.try_recv().unwrap();
            let message = session.outbound.try_recv().unwrap();
            assert!(matches!(message, ServerMessage::Frame(f) if f.feed_id == FeedId(2)));
        }
    }

    #[test]
    fn closed_session_is_pruned_without_affecting_others() {
        let registry = SessionRegistry::new(1);
        let gone = registry.connect();
        let mut alive = registry.connect();
        drop(gone);

        assert_eq!(registry.broadcast(&frame(1)), 1);
        assert_eq!(registry.session_count(), 1);
        let _init = alive.outbound.try_recv().unwrap();
        assert!(matches!(alive.outbound.try_recv().unwrap(), ServerMessage::Frame(_)));
    }

    #[test]
    fn full_queue_drops_frames_for_that_observer_only() {
        let registry = SessionRegistry::new(1);
        let _slow = registry.connect();
        let mut fast = registry.connect();

        // The slow observer never drains; its queue already holds the handshake.
        let mut delivered_total = 0;
        for _ in 0..SESSION_QUEUE_CAPACITY {
            delivered_total += registry.broadcast(&frame(1));
            while fast.outbound.try_recv().is_ok() {}
        }
        assert_eq!(registry.session_count(), 2);
        assert_eq!(delivered_total, SESSION_QUEUE_CAPACITY * 2 - 1);
        assert_eq!(registry.broadcast(&frame(1)), 1);
    }

    #[test]
    fn capture_ack_is_returned_not_queued() {
        let registry = SessionRegistry::new(3);
        let mut requester = registry.connect();
        let mut bystander = registry.connect();
        let before = Utc::now().timestamp_millis();

        let request = CaptureRequest {
            feed_id: Some(FeedId(3)),
            meta: None,
        };
        let ack = registry.handle_capture(requester.id, &request);
        assert!(ack.ok);
        assert!(ack.saved_at >= before);

        let _init = requester.outbound.try_recv().unwrap();
        assert!(requester.outbound.try_recv().is_err());

        let _init = bystander.outbound.try_recv().unwrap();
        assert!(bystander.outbound.try_recv().is_err());
    }

    #[test]
    fn capture_is_acknowledged_when_queue_is_full() {
        let registry = SessionRegistry::new(1);
        let mut session = registry.connect();
        for _ in 0..SESSION_QUEUE_CAPACITY {
            registry.broadcast(&frame(1));
        }
        // Handshake plus frames fill the queue; further frames are dropped.
        assert_eq!(registry.broadcast(&frame(1)), 0);

        let before = Utc::now().timestamp_millis();
        let ack = registry.handle_capture(session.id, &CaptureRequest::default());
        assert!(ack.ok);
        assert!(ack.saved_at >= before);

        let mut queued = 0;
        while let Ok(message) = session.outbound.try_recv() {
            assert!(!matches!(message, ServerMessage::CaptureAck(_)));
            queued += 1;
        }
        assert_eq!(queued, SESSION_QUEUE_CAPACITY);
    }

    #[test]
    fn capture_for_unknown_feed_is_still_acknowledged() {
        let registry = SessionRegistry::new(1);
        let session = registry.connect();
        let ack = registry.handle_capture(session.id, &CaptureRequest::default());
        assert!(ack.ok);
    }

    #[test]
    fn disconnect_removes_session() {
        let registry = SessionRegistry::new(1);
        let session = registry.connect();
        assert!(registry.disconnect(session.id));
        assert!(!registry.disconnect(session.id));
        assert_eq!(registry.broadcast(&frame(1)), 0);
    }
}
