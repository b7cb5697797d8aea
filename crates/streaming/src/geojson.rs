use foundation::LatLng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One hosting-capacity row as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostingCapacityRecord {
    pub feeder_id: String,
    #[serde(default)]
    pub utility: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub remaining_capacity_mw: Option<f64>,
    #[serde(default)]
    pub installed_capacity_mw: Option<f64>,
    /// Any other attributes pass through to feature properties untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HostingCapacityRecord {
    pub fn new(feeder_id: impl Into<String>) -> Self {
        Self {
            feeder_id: feeder_id.into(),
            utility: None,
            latitude: None,
            longitude: None,
            remaining_capacity_mw: None,
            installed_capacity_mw: None,
            extra: Map::new(),
        }
    }

    pub fn position(&self) -> Option<LatLng> {
        let p = LatLng::new(self.latitude?, self.longitude?);
        p.is_valid().then_some(p)
    }
}

/// Converts records to a FeatureCollection of points.
///
/// Records without a valid position are dropped. Feature ids are the record's
/// index in `records` so hover state stays addressable.
pub fn hosting_capacity_collection(records: &[HostingCapacityRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let position = record.position()?;
            let mut properties = record.extra.clone();
            properties.insert("feeder_id".into(), json!(record.feeder_id));
            properties.insert("utility".into(), json!(record.utility));
            properties.insert(
                "remaining_capacity_mw".into(),
                json!(record.remaining_capacity_mw),
            );
            properties.insert(
                "installed_capacity_mw".into(),
                json!(record.installed_capacity_mw),
            );
            Some(json!({
                "type": "Feature",
                "id": index,
                "geometry": { "type": "Point", "coordinates": position.to_lng_lat() },
                "properties": properties,
            }))
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn empty_collection() -> Value {
    json!({ "type": "FeatureCollection", "features": [] })
}

#[cfg(test)]
mod tests {
    use super::{HostingCapacityRecord, hosting_capacity_collection};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn drops_records_without_coordinates() {
        let mut located = HostingCapacityRecord::new("F-1");
        located.latitude = Some(34.0);
        located.longitude = Some(-118.2);
        located.remaining_capacity_mw = Some(2.5);
        let mut half = HostingCapacityRecord::new("F-2");
        half.latitude = Some(34.0);
        let mut bogus = HostingCapacityRecord::new("F-3");
        bogus.latitude = Some(120.0);
        bogus.longitude = Some(0.0);

        let fc = hosting_capacity_collection(&[located, half, bogus]);
        let features = fc["features"].as_array().cloned().unwrap_or_default();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["id"], json!(0));
        assert_eq!(features[0]["geometry"]["coordinates"], json!([-118.2, 34.0]));
        assert_eq!(features[0]["properties"]["feeder_id"], json!("F-1"));
        assert_eq!(features[0]["properties"]["remaining_capacity_mw"], json!(2.5));
    }

    #[test]
    fn deserializes_aliases_and_extra_fields() {
        let r: HostingCapacityRecord = serde_json::from_value(json!({
            "feeder_id": "F-9",
            "lat": 40.0,
            "lon": -75.0,
            "substation": "Eddystone"
        }))
        .expect("parse");
        assert!(r.position().is_some());
        let fc = hosting_capacity_collection(&[r]);
        assert_eq!(fc["features"][0]["properties"]["substation"], json!("Eddystone"));
        assert_eq!(fc["features"][0]["properties"]["utility"], json!(null));
    }
}
