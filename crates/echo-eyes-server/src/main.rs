//! Echo Eyes binary.
//!
//! Wires the emission scheduler to the observer push server. It loads
//! configuration and catalogs, starts the Observer API, runs the
//! scheduler, and stops both cleanly on `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `echo-eyes.yaml` (or `$ECHO_EYES_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the feed and event catalogs
//! 4. Start the Observer API server
//! 5. Start the emission scheduler
//! 6. Wait for `Ctrl-C`, then cancel and drain both tasks

mod error;
mod observer_sink;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use echo_eyes_core::{
    EchoEyesConfig, EmissionScheduler, EventCatalog, FeedCatalog, SchedulerContext,
};
use echo_eyes_observer::{AppState, ServerConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::observer_sink::ObserverSink;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "echo-eyes.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, catalogs, or the listener cannot
/// be set up.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("echo-eyes starting");
    if !from_file {
        info!(path = %config_path.display(), "No config file found, using defaults");
    }
    info!(
        port = config.server.port,
        frame_interval_ms = config.emission.frame_interval_ms,
        anomaly_threshold = config.emission.anomaly_threshold,
        anomaly_cooldown_ms = config.emission.anomaly_cooldown_ms,
        use_db = config.persistence.use_db,
        "Configuration loaded"
    );

    // 3. Load catalogs.
    let feeds = Arc::new(FeedCatalog::from_file(Path::new(&config.data.feeds_path))?);
    let events = Arc::new(EventCatalog::from_file(Path::new(&config.data.events_path))?);
    info!(feeds = feeds.len(), events = events.len(), "Catalogs loaded");

    // 4. Start Observer API server.
    let shutdown = CancellationToken::new();
    let app_state = Arc::new(
        AppState::with_shutdown(Arc::clone(&feeds), shutdown.clone())
            .with_cors_origin(config.server.cors_origin.clone()),
    );
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let observer_handle =
        echo_eyes_observer::spawn_observer(&server_config, Arc::clone(&app_state)).await?;
    info!(port = server_config.port, "Echo Eyes backend listening");

    // 5. Start the emission scheduler.
    let context = SchedulerContext::from_config(feeds, events, &config.emission);
    let scheduler = EmissionScheduler::new(
        context,
        ObserverSink::new(Arc::clone(&app_state)),
        StdRng::from_os_rng(),
        config.emission.frame_interval(),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.cancel();

    match scheduler_handle.await {
        Ok(ticks) => info!(ticks, "Emission scheduler drained"),
        Err(e) => warn!(error = %e, "Emission scheduler task failed"),
    }
    if let Err(e) = observer_handle.await {
        warn!(error = %e, "Observer server task failed");
    }

    info!("echo-eyes stopped");
    Ok(())
}

/// Resolve the configuration file path.
fn config_path() -> PathBuf {
    std::env::var_os("ECHO_EYES_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults (plus environment
/// overrides) when the file does not exist. Returns whether a file was
/// read.
fn load_config(path: &Path) -> Result<(EchoEyesConfig, bool), AppError> {
    if path.exists() {
        Ok((EchoEyesConfig::from_file(path)?, true))
    } else {
        Ok((EchoEyesConfig::parse("")?, false))
    }
}
