//! Error types for the Echo Eyes binary.
//!
//! [`AppError`] wraps every failure that can abort startup. Once the
//! scheduler and server are running nothing is fatal.

/// Top-level error for the Echo Eyes binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: echo_eyes_core::ConfigError,
    },

    /// A catalog file could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: echo_eyes_core::CatalogError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: echo_eyes_observer::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
