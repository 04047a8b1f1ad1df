//! Axum router construction for the gateway.
//!
//! Assembles the REST and `WebSocket` routes into a single [`Router`] with
//! a restricted CORS policy and HTTP tracing.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::server::{CorsSettings, ServerError};
use crate::state::AppState;
use crate::ws;

/// Prefix under which the sensor routes are mounted a second time.
pub const API_PREFIX: &str = "/api/v2";

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /ws` -- `WebSocket` event stream
/// - the sensor and scan routes listed in [`handlers`], both at the root
///   and under [`API_PREFIX`]
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::ws_handler))
        .merge(sensor_routes())
        .nest(API_PREFIX, sensor_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn sensor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sensors", get(handlers::list_sensors))
        .route("/sensor/all", get(handlers::list_sensors))
        .route("/sensor", post(handlers::create_sensor))
        .route(
            "/sensor/{id}",
            put(handlers::update_sensor).delete(handlers::delete_sensor),
        )
        .route("/sensor/{id}/start", post(handlers::start_scan))
        .route("/sensor/{id}/start-scan", post(handlers::start_scan))
        .route("/sensor/{id}/stop", post(handlers::stop_scan))
        .route("/sensor/{id}/stop-scan", post(handlers::stop_scan))
        .route("/scan/status", get(handlers::scan_status))
}

/// Build the CORS layer for the single configured dashboard origin.
///
/// # Errors
///
/// Returns [`ServerError::Cors`] if the origin is not a valid header value.
pub fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(&settings.allowed_origin)
        .map_err(|e| ServerError::Cors(format!("invalid origin {:?}: {e}", settings.allowed_origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(settings.allow_credentials))
}
