//! Configuration loading and typed config structures for the daemon.
//!
//! The configuration lives in a YAML file (default `sensorhub.yaml`, or the
//! path in `SENSORHUB_CONFIG`). Every section and field has a default, so
//! an absent file or a partial file is fine. A handful of deployment
//! settings can be overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SENSORHUB_HOST` | `server.host` |
//! | `SENSORHUB_PORT` | `server.port` |
//! | `SENSORHUB_CORS_ORIGIN` | `cors.allowed_origin` |
//! | `SENSORHUB_DATA_FILE` | `storage.sensors_path` |
//! | `SENSORHUB_SCAN_FILE` | `storage.scan_data_path` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use sensorhub_server::{CorsSettings, ServerConfig, Timing};
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "SENSORHUB_CONFIG";

/// Config file used when [`CONFIG_PATH_VAR`] is not set.
pub const DEFAULT_CONFIG_PATH: &str = "sensorhub.yaml";

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

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {source}")]
    InvalidOverride {
        /// The environment variable.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        source: std::num::ParseIntError,
    },

    /// A configured value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Listening address.
    #[serde(default)]
    pub server: ServerSection,

    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsSection,

    /// Data file locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timer periods.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HubConfig {
    /// Load the config file at `path` if it exists, apply environment
    /// overrides through `lookup`, and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or invalid, an
    /// override cannot be parsed, or a value is out of range.
    pub fn load<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file without overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. An empty document yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override deployment settings from the environment.
    ///
    /// `lookup` maps a variable name to its value; `main` passes
    /// `std::env::var`, tests pass a map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if `SENSORHUB_PORT` is not
    /// a valid port number.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SENSORHUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SENSORHUB_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidOverride {
                    var: "SENSORHUB_PORT",
                    value: port,
                    source,
                })?;
        }
        if let Some(origin) = lookup("SENSORHUB_CORS_ORIGIN") {
            self.cors.allowed_origin = origin;
        }
        if let Some(path) = lookup("SENSORHUB_DATA_FILE") {
            self.storage.sensors_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SENSORHUB_SCAN_FILE") {
            self.storage.scan_data_path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Reject values the daemon cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero intervals or an empty host
    /// or origin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "timing.scan_interval_ms must be greater than 0",
            )));
        }
        if self.timing.sync_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "timing.sync_interval_ms must be greater than 0",
            )));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from("server.host is empty")));
        }
        if self.cors.allowed_origin.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "cors.allowed_origin is empty",
            )));
        }
        Ok(())
    }

    /// Settings for the HTTP server.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            cors: CorsSettings {
                allowed_origin: self.cors.allowed_origin.clone(),
                allow_credentials: self.cors.allow_credentials,
            },
        }
    }

    /// Timer periods for the gateway.
    pub const fn timing(&self) -> Timing {
        Timing {
            scan_interval: Duration::from_millis(self.timing.scan_interval_ms),
            sync_interval: Duration::from_millis(self.timing.sync_interval_ms),
        }
    }
}

/// Listening address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Cross-origin policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorsSection {
    /// The dashboard origin.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Whether credentials are allowed.
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
            allow_credentials: true,
        }
    }
}

/// Data file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// The sensor envelope file.
    #[serde(default = "default_sensors_path")]
    pub sensors_path: PathBuf,

    /// The canned scan payload file.
    #[serde(default = "default_scan_data_path")]
    pub scan_data_path: PathBuf,

    /// Reload the sensor file when it changes on disk.
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sensors_path: default_sensors_path(),
            scan_data_path: default_scan_data_path(),
            watch: true,
        }
    }
}

/// Timer periods in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Period between scan payload emissions.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Period between `all/sync` publications.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
            sync_interval_ms: default_sync_interval_ms(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    4000
}

fn default_allowed_origin() -> String {
    String::from("http://localhost:3000")
}

const fn default_true() -> bool {
    true
}

fn default_sensors_path() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_scan_data_path() -> PathBuf {
    PathBuf::from("scan-data.json")
}

const fn default_scan_interval_ms() -> u64 {
    3000
}

const fn default_sync_interval_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    String::from("info")
}
