//! Type-safe identifier wrapper for sensors.
//!
//! Sensor ids are opaque strings. Ids minted by the backend are random
//! UUID v4 values, but records loaded from an operator-edited file may
//! carry any string (e.g. `"s1"`), so the wrapper does not insist on the
//! UUID format.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a sensor in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SensorId(pub String);

impl SensorId {
    /// Mint a fresh identifier from a random UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner string value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for SensorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SensorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<SensorId> for String {
    fn from(id: SensorId) -> Self {
        id.0
    }
}
