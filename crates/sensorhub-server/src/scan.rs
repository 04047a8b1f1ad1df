//! Simulated sensor scans.
//!
//! The [`ScanSimulator`] owns a single process-wide scan slot. Starting a
//! scan cancels whatever is running, then replays the canned payload on
//! `sensor/{id}/scanresult` once per interval until stopped. The slot is a
//! Tokio mutex, so concurrent start/stop requests are serialized and can
//! never leave an orphaned timer behind.

use std::time::Duration;

use sensorhub_store::ScanSource;
use sensorhub_types::{Ack, ScanStatus, SensorId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::scan_result_channel;
use crate::hub::Hub;
use crate::state::MIN_INTERVAL;

/// The scan currently occupying the slot.
#[derive(Debug)]
struct ActiveScan {
    sensor_id: SensorId,
    handle: JoinHandle<()>,
}

/// Single-slot scan replayer.
#[derive(Debug)]
pub struct ScanSimulator {
    hub: Hub,
    source: ScanSource,
    interval: Duration,
    slot: Mutex<Option<ActiveScan>>,
}

impl ScanSimulator {
    /// Create an idle simulator that publishes through `hub`.
    pub fn new(hub: Hub, source: ScanSource, interval: Duration) -> Self {
        Self {
            hub,
            source,
            interval: interval.max(MIN_INTERVAL),
            slot: Mutex::new(None),
        }
    }

    /// Start scanning `sensor_id`, replacing any running scan.
    ///
    /// The payload is read once here; the first emission happens one
    /// interval later. The sensor id is not checked against the registry.
    pub async fn start(&self, sensor_id: SensorId) -> Ack {
        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take() {
            previous.handle.abort();
            info!(sensor_id = %previous.sensor_id, "Cancelled running scan");
        }

        let payload = self.source.load().await;
        let channel = scan_result_channel(&sensor_id);
        let hub = self.hub.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let receivers = hub.publish(&channel, &payload);
                debug!(channel = %channel, receivers, "Scan payload emitted");
            }
        });

        info!(sensor_id = %sensor_id, interval = ?period, "Scan started");
        *slot = Some(ActiveScan { sensor_id, handle });
        Ack::ok("Scan started")
    }

    /// Stop the running scan, if any.
    ///
    /// Idempotent, and global: the id is only used for logging.
    pub async fn stop(&self, sensor_id: &SensorId) -> Ack {
        let active = self.slot.lock().await.take();
        let Some(active) = active else {
            debug!(sensor_id = %sensor_id, "Stop requested with no scan running");
            return Ack::ok("Scan stopped");
        };

        active.handle.abort();
        info!(
            sensor_id = %sensor_id,
            running = %active.sensor_id,
            "Scan stopped"
        );
        Ack::ok("Scan stopped")
    }

    /// Current state of the slot.
    pub async fn status(&self) -> ScanStatus {
        self.slot
            .lock()
            .await
            .as_ref()
            .map_or(ScanStatus::Idle, |active| ScanStatus::Scanning {
                sensor_id: active.sensor_id.clone(),
            })
    }
}

impl Drop for ScanSimulator {
    fn drop(&mut self) {
        if let Some(active) = self.slot.get_mut().take() {
            active.handle.abort();
        }
    }
}
