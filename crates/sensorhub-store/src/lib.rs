//! Sensor store for the sensor dashboard backend.
//!
//! Owns the sensor collection for the lifetime of the process and keeps
//! it mirrored to a backing store.
//!
//! ```text
//! Gateway --create/update/delete--> SensorRegistry --save--> SensorStorage
//!                                        ^                      (JSON file)
//!                                        |
//!                    SensorFileWatcher --reload-- external edits
//! ```
//!
//! # Modules
//!
//! - [`registry`] -- In-memory collection with serialized, write-then-commit mutations
//! - [`storage`] -- The [`SensorStorage`] seam with file and in-memory backends
//! - [`watcher`] -- Reloads the registry when the sensor file changes on disk
//! - [`scan_source`] -- Loads the canned scan payload with an empty fallback
//! - [`error`] -- Shared error type

pub mod error;
pub mod registry;
pub mod scan_source;
pub mod storage;
pub mod watcher;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use registry::SensorRegistry;
pub use scan_source::ScanSource;
pub use storage::{JsonFileStorage, MemoryStorage, SensorStorage};
pub use watcher::SensorFileWatcher;
