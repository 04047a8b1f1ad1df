//! Loader for the canned scan payload.
//!
//! The payload file is read-only at runtime and re-read on every scan
//! start, so an operator can swap the mock data without a restart. A read
//! or parse failure is never fatal: the empty payload is used instead.

use std::path::PathBuf;

use sensorhub_types::ScanResult;
use tracing::warn;

use crate::error::StoreError;

/// Where scan payloads come from.
#[derive(Debug, Clone)]
pub enum ScanSource {
    /// Re-read a JSON file on each load.
    File(PathBuf),
    /// Always hand out the same payload.
    Fixed(ScanResult),
}

impl ScanSource {
    /// Load the payload, falling back to [`ScanResult::default`] on error.
    pub async fn load(&self) -> ScanResult {
        self.try_load().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read scan data, using empty payload");
            ScanResult::default()
        })
    }

    /// Load the payload, reporting any read or parse failure.
    pub async fn try_load(&self) -> Result<ScanResult, StoreError> {
        match self {
            Self::Fixed(scan) => Ok(scan.clone()),
            Self::File(path) => {
                let target = path.display().to_string();
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| StoreError::Read {
                        target: target.clone(),
                        source,
                    })?;
                serde_json::from_str(&contents).map_err(|source| StoreError::Parse { target, source })
            }
        }
    }
}
