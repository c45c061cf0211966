use serde::{Deserialize, Serialize};

/// Backend REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL the routers are joined onto
    pub api_interface: String,
    /// Identifier of the node this tracker runs on
    pub node_vsn: String,
    pub node_token: String,
    pub lorawan_connection_router: String,
    pub lorawan_key_router: String,
    pub lorawan_device_router: String,
    pub sensor_hardware_router: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_interface: "http://localhost:8000/".to_string(),
            node_vsn: "W000".to_string(),
            node_token: String::new(),
            lorawan_connection_router: "lorawanconnections/".to_string(),
            lorawan_key_router: "lorawankeys/".to_string(),
            lorawan_device_router: "lorawandevices/".to_string(),
            sensor_hardware_router: "sensorhardwares/".to_string(),
        }
    }
}
