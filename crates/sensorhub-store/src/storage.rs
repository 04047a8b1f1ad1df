//! Whole-collection storage backends.
//!
//! [`SensorStorage`] is the seam between the registry and wherever the
//! sensor envelope lives. Every save rewrites the entire collection; there
//! are no partial writes, renames, or versions.
//!
//! - [`JsonFileStorage`] -- the production backend, a pretty-printed JSON file
//! - [`MemoryStorage`] -- an in-process backend for tests, with switches to
//!   simulate read and write failures

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sensorhub_types::SensorCollection;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Read and write the whole sensor collection.
#[async_trait]
pub trait SensorStorage: Send + Sync {
    /// Read the full collection.
    async fn load(&self) -> Result<SensorCollection, StoreError>;

    /// Overwrite the stored collection with `collection`.
    async fn save(&self, collection: &SensorCollection) -> Result<(), StoreError>;

    /// Short human-readable description used in logs and errors.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Sensor envelope stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SensorStorage for JsonFileStorage {
    async fn load(&self) -> Result<SensorCollection, StoreError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| StoreError::Read {
                    target: self.describe(),
                    source,
                })?;

        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            target: self.describe(),
            source,
        })
    }

    async fn save(&self, collection: &SensorCollection) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(collection)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Persistence {
                target: self.describe(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// In-process storage for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<SensorCollection>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    /// Create a storage pre-populated with `initial`.
    pub fn new(initial: SensorCollection) -> Self {
        Self {
            contents: Mutex::new(initial),
            ..Self::default()
        }
    }

    /// Make subsequent loads fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::Release);
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Release);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    /// A copy of what is currently stored.
    pub async fn contents(&self) -> SensorCollection {
        self.contents.lock().await.clone()
    }

    /// Replace the stored collection behind the registry's back, the way
    /// an operator editing the file would.
    pub async fn replace(&self, collection: SensorCollection) {
        *self.contents.lock().await = collection;
    }
}

#[async_trait]
impl SensorStorage for MemoryStorage {
    async fn load(&self) -> Result<SensorCollection, StoreError> {
        if self.fail_loads.load(Ordering::Acquire) {
            return Err(StoreError::Read {
                target: self.describe(),
                source: std::io::Error::other("simulated read failure"),
            });
        }
        Ok(self.contents.lock().await.clone())
    }

    async fn save(&self, collection: &SensorCollection) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::Acquire) {
            return Err(StoreError::Persistence {
                target: self.describe(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        *self.contents.lock().await = collection.clone();
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("memory")
    }
}
