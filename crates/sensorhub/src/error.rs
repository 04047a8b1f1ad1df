//! Error types for the sensor dashboard daemon.
//!
//! [`DaemonError`] is the top-level error type that wraps every failure
//! mode during startup and serving.

use crate::config::ConfigError;

/// Top-level error for the daemon binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The sensor file could not be loaded, or the watcher failed to start.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: sensorhub_store::StoreError,
    },

    /// The HTTP server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: sensorhub_server::ServerError,
    },
}
