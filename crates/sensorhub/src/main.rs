//! Sensor dashboard daemon.
//!
//! Wires the sensor store, the file watcher and the HTTP and `WebSocket` gateway
//! together and serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `sensorhub.yaml` (or `SENSORHUB_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the sensor file; a missing or corrupt file aborts startup
//! 4. Build the gateway state (hub, scan simulator, sync broadcaster)
//! 5. Start the file watcher, which pushes `sensorData` on external edits
//! 6. Serve HTTP and `WebSocket` requests

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use sensorhub_server::AppState;
use sensorhub_server::events::SENSOR_DATA;
use sensorhub_store::{JsonFileStorage, ScanSource, SensorFileWatcher, SensorRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH, HubConfig, LogFormat, LoggingConfig};
use crate::error::DaemonError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the sensor file cannot be
/// loaded, or the server fails.
#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    // 1. Load configuration.
    let config_path = std::env::var(CONFIG_PATH_VAR)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = HubConfig::load(&config_path, |key| std::env::var(key).ok())?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        sensors_path = %config.storage.sensors_path.display(),
        scan_data_path = %config.storage.scan_data_path.display(),
        "sensorhub starting"
    );

    // 3. Load the sensor collection.
    let storage = Arc::new(JsonFileStorage::new(&config.storage.sensors_path));
    let registry = Arc::new(SensorRegistry::load(storage).await?);

    // 4. Build the gateway state.
    let state = Arc::new(AppState::new(
        Arc::clone(&registry),
        ScanSource::File(config.storage.scan_data_path.clone()),
        config.timing(),
    ));

    // 5. Watch the sensor file for external edits.
    let _watcher = if config.storage.watch {
        let hub = state.hub.clone();
        let watcher = SensorFileWatcher::spawn(
            &config.storage.sensors_path,
            Arc::clone(&registry),
            move |collection| {
                hub.publish(SENSOR_DATA, &*collection);
            },
        )?;
        info!("Sensor file watcher started");
        Some(watcher)
    } else {
        info!("Sensor file watching disabled");
        None
    };

    // 6. Serve until Ctrl-C.
    sensorhub_server::start_server(&config.server_config(), state).await?;

    info!("sensorhub stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
}
