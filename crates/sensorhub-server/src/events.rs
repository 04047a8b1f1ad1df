//! Event frames exchanged over the `WebSocket` hub.
//!
//! Every frame is a JSON object `{ "event": <name>, "data": <payload> }`.
//! Outbound names are fixed ([`SENSOR_DATA`], [`ALL_SYNC`]) except the
//! per-sensor scan channel built by [`scan_result_channel`]. Inbound frames
//! are parsed into a [`ClientCommand`].

use sensorhub_types::SensorId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full sensor envelope, sent on connect, after mutations and after
/// external file changes.
pub const SENSOR_DATA: &str = "sensorData";

/// Periodic [`SyncView`](sensorhub_types::SyncView) projection of every sensor.
pub const ALL_SYNC: &str = "all/sync";

/// Inbound request to start scanning a sensor.
pub const START_SENSOR_SCAN: &str = "startSensorScan";

/// Inbound request to stop the running scan.
pub const STOP_SENSOR_SCAN: &str = "stopSensorScan";

/// Channel on which scan payloads for `sensor_id` are published.
pub fn scan_result_channel(sensor_id: &SensorId) -> String {
    format!("sensor/{sensor_id}/scanresult")
}

/// A single named event carried by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    /// Channel name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl HubMessage {
    /// Serialize `data` into a message on channel `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be represented as JSON.
    pub fn encode<T: Serialize + ?Sized>(
        event: impl Into<String>,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// A request sent by a dashboard client over the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Start (or restart) the scan for a sensor.
    StartScan(SensorId),
    /// Stop the running scan.
    StopScan(SensorId),
}

impl ClientCommand {
    /// The event name the reply is sent on.
    pub const fn event(&self) -> &'static str {
        match self {
            Self::StartScan(_) => START_SENSOR_SCAN,
            Self::StopScan(_) => STOP_SENSOR_SCAN,
        }
    }

    /// Parse a text frame.
    ///
    /// `data` may be the bare sensor id or an object carrying it under
    /// `sensorId` or `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] for non-JSON frames, unknown event names,
    /// and frames without a usable sensor id.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: HubMessage = serde_json::from_str(text)?;
        let build: fn(SensorId) -> Self = match frame.event.as_str() {
            START_SENSOR_SCAN => Self::StartScan,
            STOP_SENSOR_SCAN => Self::StopScan,
            _ => return Err(FrameError::UnknownEvent(frame.event)),
        };
        sensor_id_of(&frame.data)
            .map(build)
            .ok_or(FrameError::MissingSensorId)
    }
}

fn sensor_id_of(data: &Value) -> Option<SensorId> {
    let id = match data {
        Value::String(id) => id.as_str(),
        Value::Object(map) => map
            .get("sensorId")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    (!id.is_empty()).then(|| SensorId::from(id))
}

/// Reasons an inbound frame is ignored.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame was not a JSON event object.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The event name is not one the gateway handles.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The payload did not name a sensor.
    #[error("missing sensor id")]
    MissingSensorId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scan_channel_name() {
        assert_eq!(
            scan_result_channel(&SensorId::from("s1")),
            "sensor/s1/scanresult"
        );
    }

    #[test]
    fn parses_bare_and_wrapped_ids() {
        let bare = ClientCommand::parse(r#"{"event":"startSensorScan","data":"s1"}"#).unwrap();
        assert_eq!(bare, ClientCommand::StartScan(SensorId::from("s1")));

        let wrapped =
            ClientCommand::parse(r#"{"event":"stopSensorScan","data":{"sensorId":"s2"}}"#)
                .unwrap();
        assert_eq!(wrapped, ClientCommand::StopScan(SensorId::from("s2")));

        let by_id = ClientCommand::parse(r#"{"event":"startSensorScan","data":{"id":"s3"}}"#)
            .unwrap();
        assert_eq!(by_id.event(), START_SENSOR_SCAN);
    }

    #[test]
    fn rejects_bad_frames() {
        assert!(matches!(
            ClientCommand::parse("hello"),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            ClientCommand::parse(r#"{"event":"reboot","data":"s1"}"#),
            Err(FrameError::UnknownEvent(_))
        ));
        assert!(matches!(
            ClientCommand::parse(r#"{"event":"startSensorScan","data":42}"#),
            Err(FrameError::MissingSensorId)
        ));
        assert!(matches!(
            ClientCommand::parse(r#"{"event":"startSensorScan"}"#),
            Err(FrameError::MissingSensorId)
        ));
    }

    #[test]
    fn encodes_payload_as_data() {
        let msg = HubMessage::encode(ALL_SYNC, &vec![1, 2]).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "all/sync", "data": [1, 2] }));
    }
}
