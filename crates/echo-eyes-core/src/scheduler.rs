//! Periodic frame emission.
//!
//! [`EmissionScheduler`] is idle until [`EmissionScheduler::run`] is
//! awaited; from then on it fires a tick every period until the
//! cancellation token is triggered. Each tick:
//!
//! 1. captures one timestamp shared by every frame of the tick,
//! 2. runs the [`AnomalyPolicy`] for each feed,
//! 3. renders a frame (stamped with a random `CODE:` on anomalies),
//! 4. assembles a [`FrameEvent`] with location and note metadata,
//! 5. hands it to the [`FrameSink`], which fans it out to observers.
//!
//! Ticks run sequentially on one task. If a tick overruns the period the
//! missed firings are skipped, so ticks never overlap.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use echo_eyes_types::{FeedId, FrameEvent};
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyPolicy, FeedState};
use crate::catalog::{EventCatalog, FeedCatalog, check_startup_data};
use crate::config::EmissionConfig;
use crate::render::{FrameSpec, render_frame};

/// Characters used for the anomaly code stamped on frames.
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Destination for assembled frames.
///
/// Delivery is fire-and-forget: implementations must not block and must
/// swallow per-observer failures.
pub trait FrameSink: Send + Sync {
    /// Deliver a frame to every connected observer. Returns how many
    /// observers it reached.
    fn publish(&self, frame: &FrameEvent) -> usize;
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Timestamp shared by every frame of the tick.
    pub timestamp: DateTime<Utc>,
    /// Number of frames produced (one per feed).
    pub frames: usize,
    /// Number of frames flagged anomalous.
    pub anomalies: usize,
    /// Total successful deliveries across all frames.
    pub deliveries: usize,
}

/// Explicitly owned scheduling state: per-feed anomaly state plus the
/// read-only catalogs it is evaluated against.
#[derive(Debug, Clone)]
pub struct SchedulerContext {
    feeds: BTreeMap<FeedId, FeedState>,
    feed_catalog: Arc<FeedCatalog>,
    event_catalog: Arc<EventCatalog>,
    policy: AnomalyPolicy,
    code_length: usize,
}

impl SchedulerContext {
    /// Create a context with one fresh [`FeedState`] per catalog feed.
    pub fn new(
        feed_catalog: Arc<FeedCatalog>,
        event_catalog: Arc<EventCatalog>,
        policy: AnomalyPolicy,
        code_length: usize,
    ) -> Self {
        let feeds = feed_catalog
            .feeds()
            .iter()
            .map(|f| (f.id, FeedState::new()))
            .collect();
        Self {
            feeds,
            feed_catalog,
            event_catalog,
            policy,
            code_length,
        }
    }

    /// Create a context using the policy and code length from `config`.
    pub fn from_config(
        feed_catalog: Arc<FeedCatalog>,
        event_catalog: Arc<EventCatalog>,
        config: &EmissionConfig,
    ) -> Self {
        Self::new(
            feed_catalog,
            event_catalog,
            AnomalyPolicy::from_config(config),
            config.code_length,
        )
    }

    /// Anomaly state of one feed.
    pub fn feed_state(&self, id: FeedId) -> Option<&FeedState> {
        self.feeds.get(&id)
    }

    /// Number of feeds evaluated each tick.
    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    /// Produce this tick's frames, one per feed, all stamped with `now`.
    ///
    /// With an empty event catalog no anomaly can be described, so the
    /// policy is not consulted and every frame is normal.
    pub fn frames_for_tick(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<FrameEvent> {
        let can_fire = !self.event_catalog.is_empty();
        let mut frames = Vec::with_capacity(self.feeds.len());
        for (&feed_id, state) in &mut self.feeds {
            let anomalous = can_fire && self.policy.evaluate(state, now, rng);
            frames.push(assemble_frame(
                feed_id,
                now,
                anomalous,
                &self.feed_catalog,
                &self.event_catalog,
                self.code_length,
                rng,
            ));
        }
        frames
    }
}

/// Build the frame event for one feed on one tick.
///
/// Falls back to a normal frame if `anomalous` is set but the event
/// catalog has nothing to select.
pub fn assemble_frame(
    feed_id: FeedId,
    now: DateTime<Utc>,
    anomalous: bool,
    feeds: &FeedCatalog,
    events: &EventCatalog,
    code_length: usize,
    rng: &mut impl Rng,
) -> FrameEvent {
    let location = feeds.location_of(feed_id).to_owned();
    let timestamp = now.timestamp_millis();

    let event = if anomalous { events.choose(rng).cloned() } else { None };
    match event {
        Some(event) => {
            let annotation = format!("CODE:{}", anomaly_code(code_length, rng));
            let payload = render_frame(
                &FrameSpec {
                    feed_id,
                    anomaly: true,
                    annotation: &annotation,
                    at: now,
                },
                rng,
            );
            FrameEvent::anomalous(feed_id, timestamp, payload, location, event)
        }
        None => {
            let payload = render_frame(
                &FrameSpec {
                    feed_id,
                    anomaly: false,
                    annotation: "",
                    at: now,
                },
                rng,
            );
            FrameEvent::normal(feed_id, timestamp, payload, location)
        }
    }
}

/// Random uppercase alphanumeric code.
pub fn anomaly_code(len: usize, rng: &mut impl Rng) -> String {
    (0..len)
        .filter_map(|_| CODE_ALPHABET.choose(rng).copied().map(char::from))
        .collect()
}

/// Fixed-interval driver for frame generation and broadcast.
pub struct EmissionScheduler<S, R> {
    context: SchedulerContext,
    sink: S,
    rng: R,
    period: Duration,
}

impl<S, R> EmissionScheduler<S, R>
where
    S: FrameSink,
    R: Rng + Send,
{
    /// Create an idle scheduler.
    pub const fn new(context: SchedulerContext, sink: S, rng: R, period: Duration) -> Self {
        Self {
            context,
            sink,
            rng,
            period,
        }
    }

    /// The scheduling context.
    pub const fn context(&self) -> &SchedulerContext {
        &self.context
    }

    /// Run a single tick at `now` and publish its frames.
    pub fn run_tick(&mut self, now: DateTime<Utc>) -> TickSummary {
        let frames = self.context.frames_for_tick(now, &mut self.rng);
        let mut anomalies = 0_usize;
        let mut deliveries = 0_usize;
        for frame in &frames {
            if frame.anomaly {
                anomalies = anomalies.saturating_add(1);
                info!(
                    feed_id = %frame.feed_id,
                    location = frame.meta.location,
                    note = frame.meta.note,
                    "Anomaly injected"
                );
            }
            deliveries = deliveries.saturating_add(self.sink.publish(frame));
        }
        TickSummary {
            timestamp: now,
            frames: frames.len(),
            anomalies,
            deliveries,
        }
    }

    /// Tick every period until `cancel` fires. Returns the number of ticks
    /// executed.
    ///
    /// The first tick fires one full period after the call. Empty catalogs
    /// are reported once, as warnings, before the first tick.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        for empty in check_startup_data(&self.context.feed_catalog, &self.context.event_catalog) {
            warn!(%empty, "Startup data is empty, ticks will be degenerate");
        }

        info!(
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            feeds = self.context.feed_count(),
            "Emission scheduler running"
        );

        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(ticks, "Emission scheduler stopped");
                    return ticks;
                }
                _ = interval.tick() => {
                    let summary = self.run_tick(Utc::now());
                    ticks = ticks.saturating_add(1);
                    debug!(
                        tick = ticks,
                        frames = summary.frames,
                        anomalies = summary.anomalies,
                        deliveries = summary.deliveries,
                        "Tick emitted"
                    );
                }
            }
        }
    }
}
