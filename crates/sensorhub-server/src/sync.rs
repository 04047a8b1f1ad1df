//! Periodic `all/sync` publication.
//!
//! [`SyncBroadcaster::publish_now`] projects the live collection into
//! [`SyncView`]s and publishes them once. [`SyncBroadcaster::ensure_running`]
//! starts the periodic task, at most once per broadcaster no matter how
//! many clients connect.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use sensorhub_store::SensorRegistry;
use sensorhub_types::SyncView;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::ALL_SYNC;
use crate::hub::Hub;
use crate::state::MIN_INTERVAL;

/// Publishes the sync projection on a timer and on demand.
#[derive(Debug)]
pub struct SyncBroadcaster {
    hub: Hub,
    registry: Arc<SensorRegistry>,
    interval: Duration,
    task: OnceLock<JoinHandle<()>>,
}

impl SyncBroadcaster {
    /// Create a broadcaster whose periodic task is not yet running.
    pub fn new(hub: Hub, registry: Arc<SensorRegistry>, interval: Duration) -> Self {
        Self {
            hub,
            registry,
            interval: interval.max(MIN_INTERVAL),
            task: OnceLock::new(),
        }
    }

    /// Publish the current projection immediately.
    ///
    /// Returns the number of subscribers reached.
    pub async fn publish_now(&self) -> usize {
        publish_sync(&self.hub, &self.registry).await
    }

    /// Start the periodic task if it is not already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn ensure_running(&self) {
        self.task.get_or_init(|| {
            let hub = self.hub.clone();
            let registry = Arc::clone(&self.registry);
            let period = self.interval;
            info!(interval = ?period, "Starting periodic sync");

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    publish_sync(&hub, &registry).await;
                }
            })
        });
    }

    /// Whether the periodic task has been started.
    pub fn is_running(&self) -> bool {
        self.task.get().is_some()
    }
}

impl Drop for SyncBroadcaster {
    fn drop(&mut self) {
        if let Some(task) = self.task.get() {
            task.abort();
        }
    }
}

async fn publish_sync(hub: &Hub, registry: &SensorRegistry) -> usize {
    let views = SyncView::project(&*registry.list_all().await);
    let receivers = hub.publish(ALL_SYNC, &views);
    debug!(sensors = views.len(), receivers, "Sync published");
    receivers
}
