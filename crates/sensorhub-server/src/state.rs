//! Shared application state for the gateway.
//!
//! [`AppState`] bundles the sensor registry with the hub and the two
//! timer-driven publishers. It is wrapped in [`Arc`] and injected via
//! Axum's `State` extractor; nothing lives in globals.

use std::sync::Arc;
use std::time::Duration;

use sensorhub_store::{ScanSource, SensorRegistry};

use crate::events::SENSOR_DATA;
use crate::hub::Hub;
use crate::scan::ScanSimulator;
use crate::sync::SyncBroadcaster;

/// Shortest period accepted for either timer.
pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Timer periods for the scan replay and the periodic sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Period between scan payload emissions.
    pub scan_interval: Duration,
    /// Period between `all/sync` publications.
    pub sync_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(3),
            sync_interval: Duration::from_secs(5),
        }
    }
}

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// The sensor collection and its storage.
    pub registry: Arc<SensorRegistry>,
    /// Broadcast hub feeding every `WebSocket` client.
    pub hub: Hub,
    /// The single scan slot.
    pub scanner: ScanSimulator,
    /// Periodic `all/sync` publisher.
    pub sync: SyncBroadcaster,
}

impl AppState {
    /// Assemble the gateway state around a loaded registry.
    pub fn new(registry: Arc<SensorRegistry>, scan_source: ScanSource, timing: Timing) -> Self {
        let hub = Hub::new();
        let scanner = ScanSimulator::new(hub.clone(), scan_source, timing.scan_interval);
        let sync = SyncBroadcaster::new(hub.clone(), Arc::clone(&registry), timing.sync_interval);
        Self {
            registry,
            hub,
            scanner,
            sync,
        }
    }

    /// Push the full collection and the sync projection to every client.
    ///
    /// Called after each successful mutation.
    pub async fn publish_sensor_state(&self) {
        let collection = self.registry.list_all().await;
        self.hub.publish(SENSOR_DATA, &*collection);
        self.sync.publish_now().await;
    }
}
