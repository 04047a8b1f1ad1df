//! Request/event gateway for the sensor dashboard backend.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for listing, creating, updating and deleting
//!   sensors, and for starting and stopping the simulated scan
//! - **`WebSocket` endpoint** (`/ws`) carrying JSON event frames: the full
//!   sensor envelope (`sensorData`), the periodic sync projection
//!   (`all/sync`) and scan payloads (`sensor/{id}/scanresult`)
//!
//! # Architecture
//!
//! Handlers mutate the [`SensorRegistry`](sensorhub_store::SensorRegistry)
//! and, once the change is persisted, publish the new state through the
//! [`Hub`]. The [`ScanSimulator`] and [`SyncBroadcaster`] run on their own
//! timers and publish through the same hub.

pub mod error;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod scan;
pub mod server;
pub mod state;
pub mod sync;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use events::HubMessage;
pub use hub::Hub;
pub use router::{build_router, cors_layer};
pub use scan::ScanSimulator;
pub use server::{CorsSettings, ServerConfig, ServerError, start_server};
pub use state::{AppState, Timing};
pub use sync::SyncBroadcaster;
