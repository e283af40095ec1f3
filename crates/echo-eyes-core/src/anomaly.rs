//! Per-feed anomaly policy.
//!
//! A tick is anomalous for a feed when a uniform draw in `[0, 1)` exceeds
//! the threshold AND more than the cooldown has elapsed since that feed's
//! last anomaly. Both conditions must hold: a feed inside its cooldown
//! never fires, whatever the draw. A positive decision stamps the feed's
//! `last_anomaly_at` with the tick time.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::config::EmissionConfig;

/// Mutable anomaly state for one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedState {
    last_anomaly_at: DateTime<Utc>,
}

impl FeedState {
    /// A feed that has never fired (last anomaly at the Unix epoch).
    pub const fn new() -> Self {
        Self {
            last_anomaly_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Time of the most recent anomaly.
    pub const fn last_anomaly_at(&self) -> DateTime<Utc> {
        self.last_anomaly_at
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Threshold-plus-cooldown anomaly decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyPolicy {
    threshold: f64,
    cooldown: TimeDelta,
}

impl AnomalyPolicy {
    /// Create a policy. `threshold` is clamped to `[0, 1]`.
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Build a policy from the emission configuration.
    pub fn from_config(config: &EmissionConfig) -> Self {
        Self::new(config.anomaly_threshold, config.anomaly_cooldown())
    }

    /// The draw threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The cooldown between anomalies on one feed.
    pub const fn cooldown(&self) -> TimeDelta {
        self.cooldown
    }

    /// Decide with an explicit draw, updating `feed` on a positive
    /// decision.
    pub fn decide(&self, draw: f64, feed: &mut FeedState, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(feed.last_anomaly_at);
        let anomalous = draw > self.threshold && elapsed > self.cooldown;
        if anomalous {
            feed.last_anomaly_at = now;
        }
        anomalous
    }

    /// Draw once from `rng` and decide.
    pub fn evaluate(&self, feed: &mut FeedState, now: DateTime<Utc>, rng: &mut impl Rng) -> bool {
        let draw: f64 = rng.random();
        self.decide(draw, feed, now)
    }
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self::from_config(&EmissionConfig::default())
    }
}
