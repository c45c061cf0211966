use crate::domain::connection_type::ConnectionType;
use crate::domain::result::DomainResult;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a backend REST call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 2xx with the decoded body (`Null` for an empty body)
    Found(serde_json::Value),
    /// 404
    NotFound,
    /// Any other status
    Error { status: u16, detail: Option<String> },
}

impl ApiResponse {
    pub fn is_found(&self) -> bool {
        matches!(self, ApiResponse::Found(_))
    }
}

/// Body for creating a LoRaWAN device record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDevice {
    pub deveui: String,
    pub name: String,
    pub battery_level: Option<f32>,
    /// Model of the sensor hardware record this device is an instance of
    pub hardware: String,
}

/// Partial update of a LoRaWAN device record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceUpdate {
    pub name: String,
    pub battery_level: Option<f32>,
}

/// Connection-level telemetry shared by create and update bodies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionUpdate {
    pub connection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<i32>,
    pub expected_uplink_interval_sec: u32,
    pub connection_type: ConnectionType,
}

/// Body for linking a device to a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewConnection {
    pub node: String,
    pub lorawan_device: String,
    #[serde(flatten)]
    pub fields: ConnectionUpdate,
}

/// Key material of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeysUpdate {
    #[serde(rename = "network_Key")]
    pub network_key: String,
    pub app_session_key: String,
    pub dev_address: String,
    /// Only sent for OTAA connections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
}

/// Body for creating keys against a connection handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewKeys {
    pub lorawan_connection: String,
    #[serde(flatten)]
    pub keys: KeysUpdate,
}

/// Body for creating a sensor hardware record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewHardware {
    pub hardware: String,
    pub hw_model: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Client for the backend holding canonical device, connection and key records
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn get_device(&self, deveui: &str) -> DomainResult<ApiResponse>;

    async fn create_device(&self, device: &NewDevice) -> DomainResult<ApiResponse>;

    async fn update_device(&self, deveui: &str, update: &DeviceUpdate) -> DomainResult<ApiResponse>;

    async fn create_connection(&self, connection: &NewConnection) -> DomainResult<ApiResponse>;

    async fn update_connection(
        &self,
        deveui: &str,
        update: &ConnectionUpdate,
    ) -> DomainResult<ApiResponse>;

    async fn create_keys(&self, keys: &NewKeys) -> DomainResult<ApiResponse>;

    async fn update_keys(&self, deveui: &str, update: &KeysUpdate) -> DomainResult<ApiResponse>;

    async fn get_hardware(&self, hw_model: &str) -> DomainResult<ApiResponse>;

    async fn create_hardware(&self, hardware: &NewHardware) -> DomainResult<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_connection_flattens_fields() {
        let body = NewConnection {
            node: "W030".to_string(),
            lorawan_device: "7d1f5420e81235c1".to_string(),
            fields: ConnectionUpdate {
                connection_name: "SFM1x-Sap-Flow".to_string(),
                last_seen_at: Some("2023-12-13T19:47:45Z".to_string()),
                margin: Some(5),
                expected_uplink_interval_sec: 40,
                connection_type: ConnectionType::Otaa,
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "node": "W030",
                "lorawan_device": "7d1f5420e81235c1",
                "connection_name": "SFM1x-Sap-Flow",
                "last_seen_at": "2023-12-13T19:47:45Z",
                "margin": 5,
                "expected_uplink_interval_sec": 40,
                "connection_type": "OTAA"
            })
        );
    }

    #[test]
    fn test_keys_body_uses_backend_field_names() {
        let body = NewKeys {
            lorawan_connection: "W030-SFM1x-7d1f5420e81235c1".to_string(),
            keys: KeysUpdate {
                network_key: "nwk".to_string(),
                app_session_key: "apps".to_string(),
                dev_address: "00aabbcc".to_string(),
                app_key: None,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["network_Key"], "nwk");
        assert_eq!(value["lorawan_connection"], "W030-SFM1x-7d1f5420e81235c1");
        assert!(value.get("app_key").is_none());
    }

    #[test]
    fn test_api_response_is_found() {
        assert!(ApiResponse::Found(serde_json::Value::Null).is_found());
        assert!(!ApiResponse::NotFound.is_found());
        assert!(!ApiResponse::Error { status: 500, detail: None }.is_found());
    }
}
