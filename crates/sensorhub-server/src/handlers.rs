//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! Every sensor route is served both at the root and under `/api/v2`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/sensors`, `/sensor/all` | Full sensor envelope |
//! | `POST` | `/sensor` | Create a sensor |
//! | `PUT` | `/sensor/{id}` | Shallow-merge update |
//! | `DELETE` | `/sensor/{id}` | Remove a sensor |
//! | `POST` | `/sensor/{id}/start`, `/sensor/{id}/start-scan` | Start the scan |
//! | `POST` | `/sensor/{id}/stop`, `/sensor/{id}/stop-scan` | Stop the scan |
//! | `GET` | `/scan/status` | Scan slot state |
//! | `GET` | `/health` | Liveness probe with sensor count |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use sensorhub_types::{Ack, NewSensor, ScanStatus, Sensor, SensorCollection, SensorId, SensorPatch};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Success body for mutations: `{ code, message, data }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// Always 200.
    pub code: u16,
    /// Human-readable outcome.
    pub message: &'static str,
    /// The affected record or the remaining collection.
    pub data: T,
}

impl<T> DataResponse<T> {
    const fn ok(message: &'static str, data: T) -> Self {
        Self {
            code: 200,
            message,
            data,
        }
    }
}

/// Return the full sensor envelope.
pub async fn list_sensors(State(state): State<Arc<AppState>>) -> Json<SensorCollection> {
    Json((*state.registry.list_all().await).clone())
}

/// Create a sensor from `{ name, position }`.
///
/// A request with no JSON body at all is treated as an empty object, so it
/// fails on the missing fields rather than on the content type.
///
/// # Errors
///
/// 400 when either field is missing or blank or the body is not valid
/// JSON, 500 when the save fails.
pub async fn create_sensor(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewSensor>, JsonRejection>,
) -> Result<Json<DataResponse<Sensor>>, ApiError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => NewSensor::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    let sensor = state.registry.create(body).await?;
    state.publish_sensor_state().await;
    Ok(Json(DataResponse::ok("Sensor created successfully.", sensor)))
}

/// Merge the body onto the sensor with the given id.
///
/// # Errors
///
/// 400 when the body is not a valid patch, 404 for an unknown id, 500
/// when the save fails.
pub async fn update_sensor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    patch: Result<Json<SensorPatch>, JsonRejection>,
) -> Result<Json<DataResponse<Sensor>>, ApiError> {
    let Json(patch) = patch?;
    let sensor = state.registry.update(&SensorId::from(id), patch).await?;
    state.publish_sensor_state().await;
    Ok(Json(DataResponse::ok("Sensor updated successfully.", sensor)))
}

/// Remove the sensor with the given id and return what remains.
///
/// # Errors
///
/// 404 for an unknown id, 500 when the save fails.
pub async fn delete_sensor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<SensorCollection>>, ApiError> {
    let remaining = state.registry.delete(&SensorId::from(id)).await?;
    state.publish_sensor_state().await;
    Ok(Json(DataResponse::ok(
        "Sensor deleted successfully.",
        (*remaining).clone(),
    )))
}

/// Start the simulated scan for a sensor.
pub async fn start_scan(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Json<Ack> {
    Json(state.scanner.start(SensorId::from(id)).await)
}

/// Stop the running scan.
pub async fn stop_scan(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Json<Ack> {
    Json(state.scanner.stop(&SensorId::from(id)).await)
}

/// Report which sensor, if any, is being scanned.
pub async fn scan_status(State(state): State<Arc<AppState>>) -> Json<ScanStatus> {
    Json(state.scanner.status().await)
}

/// Liveness probe with the current sensor count.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sensors = state.registry.list_all().await.len();
    Json(serde_json::json!({ "status": "ok", "sensors": sensors }))
}
