//! Error types for the sensor store.
//!
//! All store operations report failures through [`StoreError`]. The
//! gateway maps the variants onto HTTP statuses; the binary treats
//! [`StoreError::Read`] and [`StoreError::Parse`] at startup as fatal.

use sensorhub_types::SensorId;

/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A creation request was missing a required field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No sensor with the given id exists.
    #[error("sensor not found: {0}")]
    NotFound(SensorId),

    /// Writing the collection to storage failed. In-memory state is
    /// left as it was before the mutation.
    #[error("failed to persist sensors to {target}: {source}")]
    Persistence {
        /// The storage the write was aimed at.
        target: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Reading the backing storage failed.
    #[error("failed to read sensors from {target}: {source}")]
    Read {
        /// The storage that was read.
        target: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The backing storage held something other than a sensor envelope.
    #[error("failed to parse sensors from {target}: {source}")]
    Parse {
        /// The storage that was read.
        target: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Serializing the collection failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Setting up the file watcher failed.
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),
}
