use common::domain::ConnectionType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Merge `incoming` into `current` key by key
///
/// Every key present in `incoming` overwrites the stored value, `null`
/// included. Where both sides hold an object the merge recurses. Keys only
/// present in `current` are kept.
pub fn deep_merge(current: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (current.get_mut(key), value) {
            deep_merge(existing, nested);
            continue;
        }
        current.insert(key.clone(), value.clone());
    }
}

/// `lorawan_device.deveui` of a stored or candidate connection, when it is a string
pub fn connection_deveui(connection: &Value) -> Option<&str> {
    connection
        .pointer("/lorawan_device/deveui")
        .and_then(Value::as_str)
}

/// Sensor hardware a device is an instance of
///
/// The typed records build candidates for the manifest; absent fields are
/// left out so they never overwrite what is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hardware {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// LoRaWAN end device, keyed by `deveui`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LorawanDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deveui: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Percent; absent when the device never reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Hardware>,
}

/// Link between this node and a device, with connection-level telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LorawanConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    /// dB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_uplink_interval_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lorawan_device: Option<LorawanDevice>,
}

/// Node manifest document
///
/// Only `lorawan_connections` is owned by the tracker; every other top-level
/// key is carried through load and save untouched. Connections are kept as
/// raw JSON so keys and values written by other tools survive a save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lorawan_connections: Option<Vec<Value>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Manifest {
    /// True iff the `lorawan_connections` key exists
    pub fn has_connections(&self) -> bool {
        self.lorawan_connections.is_some()
    }

    pub fn connections(&self) -> &[Value] {
        self.lorawan_connections.as_deref().unwrap_or(&[])
    }

    pub fn find_device(&self, deveui: &str) -> bool {
        self.connection(deveui).is_some()
    }

    pub fn connection(&self, deveui: &str) -> Option<&Value> {
        self.connections()
            .iter()
            .find(|connection| connection_deveui(connection) == Some(deveui))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Value {
        json!({
            "connection_name": "SFM",
            "margin": 5,
            "connection_type": "OTAA",
            "lorawan_device": {
                "deveui": "7d1f5420e81235c1",
                "name": "SFM1x Sap Flow",
                "battery_level": 10.0,
                "hardware": {
                    "hw_model": "SFM1x",
                    "manufacturer": "ICT International"
                }
            }
        })
    }

    fn merged(current: Value, incoming: Value) -> Value {
        let (Value::Object(mut current), Value::Object(incoming)) = (current, incoming) else {
            panic!("records must be objects");
        };
        deep_merge(&mut current, &incoming);
        Value::Object(current)
    }

    #[test]
    fn test_merge_overwrites_present_leaves_only() {
        let result = merged(stored(), json!({ "margin": 0 }));

        assert_eq!(result["margin"], json!(0));
        assert_eq!(result["connection_name"], json!("SFM"));
        assert_eq!(result["connection_type"], json!("OTAA"));
    }

    #[test]
    fn test_merge_recurses_into_nested_records() {
        let result = merged(
            stored(),
            json!({
                "lorawan_device": {
                    "battery_level": 80.0,
                    "hardware": { "sw_version": "1.2" }
                }
            }),
        );

        let device = &result["lorawan_device"];
        assert_eq!(device["battery_level"], json!(80.0));
        assert_eq!(device["name"], json!("SFM1x Sap Flow"));
        assert_eq!(device["hardware"]["sw_version"], json!("1.2"));
        assert_eq!(device["hardware"]["hw_model"], json!("SFM1x"));
        assert_eq!(device["hardware"]["manufacturer"], json!("ICT International"));
    }

    #[test]
    fn test_merge_null_overwrites() {
        let result = merged(stored(), json!({ "lorawan_device": { "battery_level": null } }));
        assert_eq!(result["lorawan_device"]["battery_level"], Value::Null);
        assert_eq!(result["lorawan_device"]["deveui"], json!("7d1f5420e81235c1"));
    }

    #[test]
    fn test_merge_fills_missing_nested_record() {
        let result = merged(json!({ "connection_name": "SFM" }), stored());
        assert_eq!(connection_deveui(&result), Some("7d1f5420e81235c1"));
    }

    #[test]
    fn test_merge_keeps_keys_it_does_not_know() {
        let mut current = stored();
        current["uuid"] = json!("abc");
        current["lorawan_device"]["labels"] = json!({ "site": "north" });

        let result = merged(current, json!({ "margin": 2 }));
        assert_eq!(result["uuid"], json!("abc"));
        assert_eq!(result["lorawan_device"]["labels"], json!({ "site": "north" }));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merged(json!({}), stored());
        let twice = merged(once.clone(), stored());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_typed_record_omits_absent_fields() {
        let record = LorawanConnection {
            margin: Some(5),
            connection_type: Some(ConnectionType::Otaa),
            lorawan_device: Some(LorawanDevice {
                deveui: Some("7d1f5420e81235c1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "margin": 5,
                "connection_type": "OTAA",
                "lorawan_device": { "deveui": "7d1f5420e81235c1" }
            })
        );
    }

    #[test]
    fn test_connection_deveui_requires_string() {
        assert_eq!(connection_deveui(&stored()), Some("7d1f5420e81235c1"));
        assert_eq!(connection_deveui(&json!({ "lorawan_device": { "deveui": 12 } })), None);
        assert_eq!(connection_deveui(&json!("SFM")), None);
    }

    #[test]
    fn test_find_device() {
        let manifest = Manifest {
            lorawan_connections: Some(vec![stored(), json!(42)]),
            ..Default::default()
        };

        assert!(manifest.has_connections());
        assert!(manifest.find_device("7d1f5420e81235c1"));
        assert!(!manifest.find_device("123456789"));
    }

    #[test]
    fn test_find_device_without_connections() {
        let manifest = Manifest::default();
        assert!(!manifest.has_connections());
        assert!(!manifest.find_device("7d1f5420e81235c1"));
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let document = json!({
            "vsn": "W030",
            "gps_lat": 41.7,
            "lorawan_connections": [{
                "uuid": "abc",
                "connection_type": "otaa",
                "lorawan_device": { "deveui": "7d1f5420e81235c1", "battery_level": null }
            }]
        });

        let manifest: Manifest = serde_json::from_value(document.clone()).unwrap();
        assert!(manifest.has_connections());
        assert_eq!(manifest.other.get("vsn"), Some(&json!("W030")));
        assert_eq!(serde_json::to_value(&manifest).unwrap(), document);
    }
}
