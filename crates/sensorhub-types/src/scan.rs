//! Mock scan payloads and the scan simulator's observable status.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::ids::SensorId;

/// Canned scan payload replayed verbatim while a sensor is scanning.
///
/// The file format is `{ "data": { "aps": [...], "stations": [...] } }`.
/// [`ScanResult::default`] is the empty payload used when the file cannot
/// be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScanResult {
    /// Observed access points and stations.
    #[serde(default)]
    pub data: ScanData,
}

/// Body of a [`ScanResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScanData {
    /// Access points seen by the scan.
    #[serde(default)]
    pub aps: Vec<Value>,
    /// Client stations seen by the scan.
    #[serde(default)]
    pub stations: Vec<Value>,
}

/// Current state of the single scan slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ScanStatus {
    /// No scan is running.
    #[default]
    Idle,
    /// A scan is replaying payloads for `sensor_id`.
    Scanning {
        /// The sensor whose channel receives the payloads.
        sensor_id: SensorId,
    },
}

impl ScanStatus {
    /// Whether a scan is currently running.
    pub const fn is_scanning(&self) -> bool {
        matches!(self, Self::Scanning { .. })
    }
}

/// Acknowledgement returned by scan start/stop, over REST and `WebSocket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ack {
    /// HTTP-style status code, always 200 for an acknowledgement.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl Ack {
    /// Build a successful acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
        }
    }
}
