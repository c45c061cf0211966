use common::backend::BackendConfig;
use common::chirpstack::ChirpstackConfig;
use common::telemetry::{LogFormat, TelemetryConfig};
use config::{Config, ConfigError, Environment};
use lorawan_tracker::domain::{TrackerConfig, DEFAULT_MANIFEST_PATH};
use lorawan_tracker::mqtt::{MqttSubscriberConfig, DEFAULT_EVENT_TOPIC};
use lorawan_tracker::LorawanTrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format (json, pretty)
    #[serde(default)]
    pub log_format: LogFormat,

    /// Node identifier, e.g. W030
    #[serde(default = "default_node_vsn")]
    pub node_vsn: String,

    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    // MQTT configuration
    #[serde(default = "default_mqtt_broker_url")]
    pub mqtt_broker_url: String,

    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,

    #[serde(default = "default_mqtt_keep_alive_secs")]
    pub mqtt_keep_alive_secs: u64,

    #[serde(default = "default_mqtt_retry_delay_secs")]
    pub mqtt_retry_delay_secs: u64,

    #[serde(default = "default_mqtt_max_retry_attempts")]
    pub mqtt_max_retry_attempts: u32,

    // ChirpStack configuration
    /// host:port of the ChirpStack gRPC API
    #[serde(default = "default_chirpstack_api_interface")]
    pub chirpstack_api_interface: String,

    #[serde(default = "default_chirpstack_account_email")]
    pub chirpstack_account_email: String,

    #[serde(default = "default_chirpstack_account_password")]
    pub chirpstack_account_password: String,

    // Backend configuration
    /// Base URL of the backend REST API
    #[serde(default = "default_api_interface")]
    pub api_interface: String,

    #[serde(default)]
    pub node_token: String,

    #[serde(default = "default_lorawan_connection_router")]
    pub lorawan_connection_router: String,

    #[serde(default = "default_lorawan_key_router")]
    pub lorawan_key_router: String,

    #[serde(default = "default_lorawan_device_router")]
    pub lorawan_device_router: String,

    #[serde(default = "default_sensor_hardware_router")]
    pub sensor_hardware_router: String,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// Time allowed for shutdown cleanup in seconds
    #[serde(default = "default_closer_timeout_secs")]
    pub closer_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_node_vsn() -> String {
    BackendConfig::default().node_vsn
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_PATH)
}

// MQTT defaults
fn default_mqtt_broker_url() -> String {
    "mqtt://wes-rabbitmq:1883".to_string()
}

fn default_mqtt_client_id() -> String {
    "lorawan-tracker".to_string()
}

fn default_mqtt_topic() -> String {
    DEFAULT_EVENT_TOPIC.to_string()
}

fn default_mqtt_keep_alive_secs() -> u64 {
    60
}

fn default_mqtt_retry_delay_secs() -> u64 {
    5
}

fn default_mqtt_max_retry_attempts() -> u32 {
    5
}

// ChirpStack defaults
fn default_chirpstack_api_interface() -> String {
    ChirpstackConfig::default().api_interface
}

fn default_chirpstack_account_email() -> String {
    ChirpstackConfig::default().account_email
}

fn default_chirpstack_account_password() -> String {
    ChirpstackConfig::default().account_password
}

// Backend defaults
fn default_api_interface() -> String {
    BackendConfig::default().api_interface
}

fn default_lorawan_connection_router() -> String {
    BackendConfig::default().lorawan_connection_router
}

fn default_lorawan_key_router() -> String {
    BackendConfig::default().lorawan_key_router
}

fn default_lorawan_device_router() -> String {
    BackendConfig::default().lorawan_device_router
}

fn default_sensor_hardware_router() -> String {
    BackendConfig::default().sensor_hardware_router
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_closer_timeout_secs() -> u64 {
    10
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("LORAWAN_TRACKER"))
            .build()?
            .try_deserialize()
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn closer_timeout(&self) -> Duration {
        Duration::from_secs(self.closer_timeout_secs)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: "lorawan-tracker".to_string(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }

    pub fn chirpstack(&self) -> ChirpstackConfig {
        ChirpstackConfig {
            api_interface: self.chirpstack_api_interface.clone(),
            account_email: self.chirpstack_account_email.clone(),
            account_password: self.chirpstack_account_password.clone(),
            connect_timeout_secs: self.startup_timeout_secs,
        }
    }

    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            api_interface: self.api_interface.clone(),
            node_vsn: self.node_vsn.clone(),
            node_token: self.node_token.clone(),
            lorawan_connection_router: self.lorawan_connection_router.clone(),
            lorawan_key_router: self.lorawan_key_router.clone(),
            lorawan_device_router: self.lorawan_device_router.clone(),
            sensor_hardware_router: self.sensor_hardware_router.clone(),
        }
    }

    pub fn tracker(&self) -> LorawanTrackerConfig {
        LorawanTrackerConfig {
            tracker: TrackerConfig {
                node_vsn: self.node_vsn.clone(),
                manifest_path: self.manifest_path.clone(),
            },
            mqtt: MqttSubscriberConfig {
                broker_url: self.mqtt_broker_url.clone(),
                client_id: self.mqtt_client_id.clone(),
                topic: self.mqtt_topic.clone(),
                keep_alive_secs: self.mqtt_keep_alive_secs,
                retry_delay_secs: self.mqtt_retry_delay_secs,
                max_retry_attempts: self.mqtt_max_retry_attempts,
            },
        }
    }
}
