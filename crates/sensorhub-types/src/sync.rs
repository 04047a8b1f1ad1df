//! Lightweight per-sensor projection broadcast on the `all/sync` channel.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use ts_rs::TS;

use crate::ids::SensorId;
use crate::sensor::{Sensor, SensorCollection};

/// Reduced view of a [`Sensor`] used for periodic client reconciliation.
///
/// Derived from the live collection on every publish; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SyncView {
    /// Sensor id.
    pub id: SensorId,
    /// Operational state.
    #[ts(type = "number")]
    pub state: Number,
    /// Card configuration.
    pub cards: Value,
    /// Rule configuration.
    pub rules: Value,
    /// Scan time limit.
    #[ts(type = "number")]
    pub time_limit: Number,
    /// Scan packet limit.
    #[ts(type = "number")]
    pub packet_limit: Number,
    /// Attack target configuration.
    pub attack_list: Value,
}

impl SyncView {
    /// Project every sensor of a collection, preserving order.
    pub fn project(collection: &SensorCollection) -> Vec<Self> {
        collection.data.iter().map(Self::from).collect()
    }
}

impl From<&Sensor> for SyncView {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id.clone(),
            state: sensor.state.clone(),
            cards: sensor.cards.clone(),
            rules: sensor.rules.clone(),
            time_limit: sensor.time_limit.clone(),
            packet_limit: sensor.packet_limit.clone(),
            attack_list: sensor.attack_list.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn projection_keeps_order_and_drops_extra_fields() {
        let a = Sensor::new(SensorId::from("a"), "A".into(), "P1".into(), Utc::now());
        let mut b = Sensor::new(SensorId::from("b"), "B".into(), "P2".into(), Utc::now());
        b.time_limit = Number::from(30);
        b.extra.insert("mac".into(), Value::from("aa:bb"));
        let views = SyncView::project(&SensorCollection::new(vec![a, b]));

        assert_eq!(views.len(), 2);
        assert_eq!(views.first().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(views.get(1).map(|v| &v.time_limit), Some(&Number::from(30)));

        let json = serde_json::to_value(views.get(1).unwrap()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(!keys.contains(&"name"));
        assert!(!keys.contains(&"position"));
        assert!(!keys.contains(&"mac"));
        assert!(keys.contains(&"attack_list"));
    }
}
