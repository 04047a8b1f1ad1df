//! Shared type definitions for the sensor dashboard backend.
//!
//! This crate is the single source of truth for the records exchanged
//! between the store, the gateway, and the dashboard. Types flow
//! downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed sensor identifier
//! - [`sensor`] -- Sensor records, the persisted envelope, create/patch payloads
//! - [`sync`] -- The `all/sync` projection
//! - [`scan`] -- Mock scan payloads, scan status, acknowledgements

pub mod ids;
pub mod scan;
pub mod sensor;
pub mod sync;

// Re-export all public types at crate root for convenience.
pub use ids::SensorId;
pub use scan::{Ack, ScanData, ScanResult, ScanStatus};
pub use sensor::{NewSensor, SENSOR_STATE_INACTIVE, Sensor, SensorCollection, SensorPatch};
pub use sync::SyncView;
