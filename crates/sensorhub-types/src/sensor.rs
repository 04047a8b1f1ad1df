//! Sensor records, the persisted envelope, and the request payloads that
//! create and patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use ts_rs::TS;

use crate::ids::SensorId;

/// Operational state assigned to a freshly created sensor.
pub const SENSOR_STATE_INACTIVE: u8 = 0;

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// One physical or logical scanning device.
///
/// `cards`, `rules` and `attack_list` are opaque to the backend: they are
/// carried through untouched and only replaced wholesale by a patch. Keys
/// outside the known field list are kept in `extra` and written back out
/// alongside the known fields.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Sensor {
    /// Unique, immutable identifier.
    pub id: SensorId,
    /// Display name.
    pub name: String,
    /// Free-form installation position.
    pub position: String,
    /// Numeric operational state. Older files call this field `status`.
    #[ts(type = "number")]
    pub state: Number,
    /// When the sensor was created.
    pub last_seen: DateTime<Utc>,
    /// Card configuration.
    pub cards: Value,
    /// Rule configuration.
    pub rules: Value,
    /// Attack target configuration.
    pub attack_list: Value,
    /// Scan time limit.
    #[ts(type = "number")]
    pub time_limit: Number,
    /// Scan packet limit.
    #[ts(type = "number")]
    pub packet_limit: Number,
    /// Access points flagged for notification.
    pub noti_aps: Vec<Value>,
    /// Clients flagged for notification.
    pub noti_clients: Vec<Value>,
    /// Channels flagged for notification.
    pub noti_channels: Vec<Value>,
    /// Operator-added keys with no dedicated field.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl Sensor {
    /// Build a new sensor with every optional field at its default.
    pub fn new(id: SensorId, name: String, position: String, last_seen: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            position,
            state: Number::from(SENSOR_STATE_INACTIVE),
            last_seen,
            cards: empty_array(),
            rules: empty_array(),
            attack_list: empty_object(),
            time_limit: Number::from(0),
            packet_limit: Number::from(0),
            noti_aps: Vec::new(),
            noti_clients: Vec::new(),
            noti_channels: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// On-disk shape of a sensor before normalisation.
///
/// Numeric fields are read as raw JSON so that a float, a negative or a
/// numeric string never fails the whole file.
#[derive(Deserialize)]
struct SensorRecord {
    id: SensorId,
    name: String,
    position: String,
    #[serde(default)]
    state: Option<Value>,
    last_seen: DateTime<Utc>,
    #[serde(default = "empty_array")]
    cards: Value,
    #[serde(default = "empty_array")]
    rules: Value,
    #[serde(default = "empty_object")]
    attack_list: Value,
    #[serde(default)]
    time_limit: Option<Value>,
    #[serde(default)]
    packet_limit: Option<Value>,
    #[serde(default)]
    noti_aps: Vec<Value>,
    #[serde(default)]
    noti_clients: Vec<Value>,
    #[serde(default)]
    noti_channels: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<SensorRecord> for Sensor {
    fn from(record: SensorRecord) -> Self {
        let mut extra = record.extra;
        // `status` only stands in for `state` when the latter is absent.
        let state = record.state.or_else(|| extra.remove("status"));
        Self {
            id: record.id,
            name: record.name,
            position: record.position,
            state: lenient_number(state),
            last_seen: record.last_seen,
            cards: record.cards,
            rules: record.rules,
            attack_list: record.attack_list,
            time_limit: lenient_number(record.time_limit),
            packet_limit: lenient_number(record.packet_limit),
            noti_aps: record.noti_aps,
            noti_clients: record.noti_clients,
            noti_channels: record.noti_channels,
            extra,
        }
    }
}

impl<'de> Deserialize<'de> for Sensor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SensorRecord::deserialize(deserializer).map(Self::from)
    }
}

/// Numbers pass through as-is, numeric strings are parsed, anything else
/// reads as zero.
fn lenient_number(value: Option<Value>) -> Number {
    match value {
        Some(Value::Number(number)) => number,
        Some(Value::String(text)) => text.trim().parse().unwrap_or_else(|_| Number::from(0)),
        _ => Number::from(0),
    }
}

// ---------------------------------------------------------------------------
// SensorCollection
// ---------------------------------------------------------------------------

/// The persisted and returned envelope: `{ "data": [...], ...metadata }`.
///
/// Keys other than `data` are kept verbatim so that a load/save cycle
/// never drops operator-supplied metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorCollection {
    /// Sensors in insertion order.
    pub data: Vec<Sensor>,
    /// Any other top-level keys found in the envelope.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl SensorCollection {
    /// Wrap a list of sensors in an envelope with no metadata.
    pub fn new(data: Vec<Sensor>) -> Self {
        Self {
            data,
            metadata: Map::new(),
        }
    }

    /// Number of sensors in the collection.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the collection holds no sensors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Look up a sensor by id.
    pub fn find(&self, id: &SensorId) -> Option<&Sensor> {
        self.data.iter().find(|s| &s.id == id)
    }

    /// Index of the sensor with the given id, if present.
    pub fn position_of(&self, id: &SensorId) -> Option<usize> {
        self.data.iter().position(|s| &s.id == id)
    }

    /// Whether a sensor with the given id exists.
    pub fn contains(&self, id: &SensorId) -> bool {
        self.position_of(id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of a sensor creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewSensor {
    /// Required display name.
    pub name: Option<String>,
    /// Required installation position.
    pub position: Option<String>,
}

impl NewSensor {
    /// Convenience constructor for callers that already hold both fields.
    pub fn new(name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            position: Some(position.into()),
        }
    }

    /// Check that both required fields are present and non-blank,
    /// returning them on success.
    pub fn validate(&self) -> Result<(&str, &str), String> {
        match (non_blank(self.name.as_ref()), non_blank(self.position.as_ref())) {
            (Some(name), Some(position)) => Ok((name, position)),
            _ => Err(String::from("Name and position are required fields.")),
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Partial update applied with a shallow, field-level merge.
///
/// Absent fields are left alone. Nested values such as `cards` are
/// replaced as a whole, never merged. Unknown keys are merged into the
/// sensor's extra keys; the id cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SensorPatch {
    /// New display name.
    pub name: Option<String>,
    /// New installation position.
    pub position: Option<String>,
    /// New operational state.
    #[ts(type = "number | null")]
    pub state: Option<Number>,
    /// New last-seen timestamp.
    pub last_seen: Option<DateTime<Utc>>,
    /// Replacement card configuration.
    pub cards: Option<Value>,
    /// Replacement rule configuration.
    pub rules: Option<Value>,
    /// Replacement attack target configuration.
    pub attack_list: Option<Value>,
    /// New scan time limit.
    #[ts(type = "number | null")]
    pub time_limit: Option<Number>,
    /// New scan packet limit.
    #[ts(type = "number | null")]
    pub packet_limit: Option<Number>,
    /// Replacement access point notification list.
    pub noti_aps: Option<Vec<Value>>,
    /// Replacement client notification list.
    pub noti_clients: Option<Vec<Value>>,
    /// Replacement channel notification list.
    pub noti_channels: Option<Vec<Value>>,
    /// Any other keys, merged one by one.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl SensorPatch {
    /// Merge the present fields onto `sensor`.
    pub fn apply(self, sensor: &mut Sensor) {
        if let Some(name) = self.name {
            sensor.name = name;
        }
        if let Some(position) = self.position {
            sensor.position = position;
        }
        if let Some(state) = self.state {
            sensor.state = state;
        }
        if let Some(last_seen) = self.last_seen {
            sensor.last_seen = last_seen;
        }
        if let Some(cards) = self.cards {
            sensor.cards = cards;
        }
        if let Some(rules) = self.rules {
            sensor.rules = rules;
        }
        if let Some(attack_list) = self.attack_list {
            sensor.attack_list = attack_list;
        }
        if let Some(time_limit) = self.time_limit {
            sensor.time_limit = time_limit;
        }
        if let Some(packet_limit) = self.packet_limit {
            sensor.packet_limit = packet_limit;
        }
        if let Some(noti_aps) = self.noti_aps {
            sensor.noti_aps = noti_aps;
        }
        if let Some(noti_clients) = self.noti_clients {
            sensor.noti_clients = noti_clients;
        }
        if let Some(noti_channels) = self.noti_channels {
            sensor.noti_channels = noti_channels;
        }
        sensor
            .extra
            .extend(self.extra.into_iter().filter(|(key, _)| key != "id"));
    }

    /// Whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.position.is_none()
            && self.state.is_none()
            && self.last_seen.is_none()
            && self.cards.is_none()
            && self.rules.is_none()
            && self.attack_list.is_none()
            && self.time_limit.is_none()
            && self.packet_limit.is_none()
            && self.noti_aps.is_none()
            && self.noti_clients.is_none()
            && self.noti_channels.is_none()
            && self.extra.keys().all(|key| key == "id")
    }
}
