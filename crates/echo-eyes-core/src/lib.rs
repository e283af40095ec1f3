//! Frame generation core for Echo Eyes.
//!
//! Echo Eyes simulates a bank of surveillance feeds. Every tick the
//! [`scheduler`] renders one synthetic frame per feed, occasionally
//! flagging an anomaly, and pushes the result to connected observers
//! through a [`FrameSink`](scheduler::FrameSink).
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`catalog`] -- Static feed and anomaly event catalogs
//! - [`anomaly`] -- Threshold-plus-cooldown anomaly policy
//! - [`render`] -- SVG frame renderer producing `data:` URLs
//! - [`scheduler`] -- Fixed-interval tick driver

pub mod anomaly;
pub mod catalog;
pub mod config;
pub mod render;
pub mod scheduler;

pub use anomaly::{AnomalyPolicy, FeedState};
pub use catalog::{CatalogError, EventCatalog, FeedCatalog, StartupDataEmpty};
pub use config::{ConfigError, EchoEyesConfig};
pub use scheduler::{EmissionScheduler, FrameSink, SchedulerContext, TickSummary};
