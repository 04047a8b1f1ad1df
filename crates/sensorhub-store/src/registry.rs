//! The sensor registry: the in-memory collection and its storage mirror.
//!
//! # Concurrency
//!
//! Readers get an [`Arc`] snapshot of the current collection, so
//! [`SensorRegistry::list_all`] never copies sensors. Every mutation (and
//! every reload) goes through a single writer mutex, so two handlers can
//! never both start from the same snapshot and lose each other's update.
//!
//! # Write-then-commit
//!
//! A mutation is applied to a copy of the collection, the copy is saved,
//! and only after the save succeeds does the copy become the current
//! snapshot. A failed save leaves memory exactly as it was.

use std::sync::Arc;

use chrono::Utc;
use sensorhub_types::{NewSensor, Sensor, SensorCollection, SensorId, SensorPatch};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::storage::SensorStorage;

/// Owner of the sensor collection for the lifetime of the process.
pub struct SensorRegistry {
    storage: Arc<dyn SensorStorage>,
    current: RwLock<Arc<SensorCollection>>,
    writer: Mutex<()>,
}

impl core::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("storage", &self.storage.describe())
            .finish_non_exhaustive()
    }
}

impl SensorRegistry {
    /// Load the collection from `storage` and take ownership of it.
    ///
    /// There is no silent empty fallback: a read or parse failure is
    /// returned to the caller, which at startup means the process exits.
    pub async fn load(storage: Arc<dyn SensorStorage>) -> Result<Self, StoreError> {
        let collection = storage.load().await?;
        info!(
            storage = %storage.describe(),
            sensors = collection.len(),
            "Sensor collection loaded"
        );
        Ok(Self::with_collection(storage, collection))
    }

    /// Build a registry around an already-loaded collection.
    pub fn with_collection(storage: Arc<dyn SensorStorage>, collection: SensorCollection) -> Self {
        Self {
            storage,
            current: RwLock::new(Arc::new(collection)),
            writer: Mutex::new(()),
        }
    }

    /// The current collection.
    pub async fn list_all(&self) -> Arc<SensorCollection> {
        Arc::clone(&*self.current.read().await)
    }

    /// A copy of a single sensor, if it exists.
    pub async fn get(&self, id: &SensorId) -> Option<Sensor> {
        self.current.read().await.find(id).cloned()
    }

    /// Create a sensor from `request`, persist, and return it.
    pub async fn create(&self, request: NewSensor) -> Result<Sensor, StoreError> {
        let (name, position) = request.validate().map_err(StoreError::Validation)?;

        let _guard = self.writer.lock().await;
        let mut next = (*self.list_all().await).clone();

        let mut id = SensorId::generate();
        while next.contains(&id) {
            id = SensorId::generate();
        }

        let sensor = Sensor::new(id, name.to_owned(), position.to_owned(), Utc::now());
        next.data.push(sensor.clone());
        self.commit(next).await?;

        info!(sensor_id = %sensor.id, name = %sensor.name, "Sensor created");
        Ok(sensor)
    }

    /// Shallow-merge `patch` onto the sensor with `id`, persist, and
    /// return the merged record.
    pub async fn update(&self, id: &SensorId, patch: SensorPatch) -> Result<Sensor, StoreError> {
        let _guard = self.writer.lock().await;
        let mut next = (*self.list_all().await).clone();

        let sensor = next
            .data
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        patch.apply(sensor);
        let updated = sensor.clone();

        self.commit(next).await?;

        info!(sensor_id = %id, "Sensor updated");
        Ok(updated)
    }

    /// Remove the sensor with `id`, persist, and return what remains.
    pub async fn delete(&self, id: &SensorId) -> Result<Arc<SensorCollection>, StoreError> {
        let _guard = self.writer.lock().await;
        let mut next = (*self.list_all().await).clone();

        let before = next.len();
        next.data.retain(|s| &s.id != id);
        if next.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }

        let committed = self.commit(next).await?;

        info!(sensor_id = %id, remaining = committed.len(), "Sensor deleted");
        Ok(committed)
    }

    /// Re-read storage and replace the in-memory collection wholesale.
    ///
    /// Returns `None` when storage holds exactly the current collection,
    /// which is what a reload right after one of our own commits sees.
    /// On failure the error is logged and the previous collection stays
    /// in place.
    pub async fn reload(&self) -> Result<Option<Arc<SensorCollection>>, StoreError> {
        let _guard = self.writer.lock().await;

        let collection = self.storage.load().await.inspect_err(|e| {
            warn!(
                storage = %self.storage.describe(),
                error = %e,
                "Sensor reload failed, keeping previous state"
            );
        })?;

        if collection == **self.current.read().await {
            debug!("Sensor storage unchanged, skipping reload");
            return Ok(None);
        }

        let collection = Arc::new(collection);
        *self.current.write().await = Arc::clone(&collection);
        info!(sensors = collection.len(), "Sensor collection reloaded");
        Ok(Some(collection))
    }

    /// Save `next` and, only if that succeeds, make it current.
    async fn commit(&self, next: SensorCollection) -> Result<Arc<SensorCollection>, StoreError> {
        self.storage.save(&next).await?;
        let next = Arc::new(next);
        *self.current.write().await = Arc::clone(&next);
        Ok(next)
    }
}
