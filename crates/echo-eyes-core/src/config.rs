//! Configuration loading and typed config structures for Echo Eyes.
//!
//! The configuration lives in `echo-eyes.yaml`. Every section and field
//! has a default, so an empty document (or no file at all) yields a
//! working setup matching the stock simulator: port 5000, a frame every
//! 2 seconds, roughly an 8% anomaly chance per feed per tick and a
//! 10 second cooldown.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Echo Eyes configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EchoEyesConfig {
    /// HTTP / push channel settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Frame emission and anomaly policy parameters.
    #[serde(default)]
    pub emission: EmissionConfig,

    /// Catalog file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Persistence backend toggle.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EchoEyesConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `PORT` overrides `server.port`
    /// - `USE_DB` overrides `persistence.use_db`
    /// - `CORS_ORIGIN` overrides `server.cors_origin`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored and the existing value is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("USE_DB") {
            self.persistence.use_db = matches!(
                val.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            let origin = origin.trim().to_owned();
            self.server.cors_origin = if origin.is_empty() { None } else { Some(origin) };
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emission.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "emission.frame_interval_ms must be at least 1".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.emission.anomaly_threshold) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "emission.anomaly_threshold must be within [0, 1], got {}",
                    self.emission.anomaly_threshold
                ),
            });
        }
        if self.emission.code_length == 0 {
            return Err(ConfigError::Invalid {
                reason: "emission.code_length must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin for the observer dashboard. Any origin is
    /// allowed when unset.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

/// Frame emission and anomaly policy parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmissionConfig {
    /// Milliseconds between ticks.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// A uniform draw must exceed this value for a tick to be anomalous.
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,

    /// Minimum milliseconds between two anomalies on the same feed.
    #[serde(default = "default_anomaly_cooldown_ms")]
    pub anomaly_cooldown_ms: u64,

    /// Length of the alphanumeric code stamped on anomalous frames.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

impl EmissionConfig {
    /// The tick period as a [`Duration`].
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// The anomaly cooldown as a [`Duration`].
    pub const fn anomaly_cooldown(&self) -> Duration {
        Duration::from_millis(self.anomaly_cooldown_ms)
    }
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            anomaly_threshold: default_anomaly_threshold(),
            anomaly_cooldown_ms: default_anomaly_cooldown_ms(),
            code_length: default_code_length(),
        }
    }
}

/// Catalog file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Path to the feed catalog JSON file.
    #[serde(default = "default_feeds_path")]
    pub feeds_path: String,

    /// Path to the anomaly event catalog JSON file.
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            feeds_path: default_feeds_path(),
            events_path: default_events_path(),
        }
    }
}

/// Persistence backend toggle. Read and reported at startup; no backend
/// is wired in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Whether a persistence backend is enabled.
    #[serde(default)]
    pub use_db: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    5000
}

const fn default_frame_interval_ms() -> u64 {
    2000
}

const fn default_anomaly_threshold() -> f64 {
    0.92
}

const fn default_anomaly_cooldown_ms() -> u64 {
    10_000
}

const fn default_code_length() -> usize {
    8
}

fn default_feeds_path() -> String {
    "data/feeds.json".to_owned()
}

fn default_events_path() -> String {
    "data/events.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_simulator() {
        let config = EchoEyesConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.emission.frame_interval(), Duration::from_millis(2000));
        assert_eq!(config.emission.anomaly_cooldown(), Duration::from_secs(10));
        assert!((config.emission.anomaly_threshold - 0.92).abs() < f64::EPSILON);
        assert_eq!(config.emission.code_length, 8);
        assert!(!config.persistence.use_db);
        assert_eq!(config.data.feeds_path, "data/feeds.json");
    }

    #[test]
    fn parse_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  port: 6100
emission:
  frame_interval_ms: 500
persistence:
  use_db: true
"#;
        let config: EchoEyesConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 6100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.emission.frame_interval_ms, 500);
        assert_eq!(config.emission.anomaly_cooldown_ms, 10_000);
        assert!(config.persistence.use_db);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn overrides_replace_port_db_flag_and_origin() {
        let mut config = EchoEyesConfig::default();
        config.apply_overrides(|key| match key {
            "PORT" => Some("7000".to_owned()),
            "USE_DB" => Some("true".to_owned()),
            "CORS_ORIGIN" => Some("https://dash.example".to_owned()),
            _ => None,
        });
        assert_eq!(config.server.port, 7000);
        assert!(config.persistence.use_db);
        assert_eq!(config.server.cors_origin.as_deref(), Some("https://dash.example"));
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = EchoEyesConfig::default();
        config.apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_owned()));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = EchoEyesConfig::default();
        config.emission.frame_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let mut config = EchoEyesConfig::default();
        config.emission.anomaly_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<EchoEyesConfig, _> = serde_yml::from_str("server: [unclosed");
        assert!(result.is_err());
    }
}
