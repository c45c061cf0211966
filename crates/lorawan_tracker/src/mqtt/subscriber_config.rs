use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network server integration topic for all device events of all applications
pub const DEFAULT_EVENT_TOPIC: &str = "application/+/device/+/event/up";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSubscriberConfig {
    /// Broker address as `mqtt://host:port`, `tcp://host:port` or `host:port`
    pub broker_url: String,

    pub client_id: String,

    pub topic: String,

    pub keep_alive_secs: u64,

    /// Delay before reconnecting after a broker error (default: 5 seconds)
    pub retry_delay_secs: u64,

    /// Consecutive broker errors tolerated before giving up (default: 5)
    pub max_retry_attempts: u32,
}

impl Default for MqttSubscriberConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://localhost:1883".to_string(),
            client_id: "lorawan-tracker".to_string(),
            topic: DEFAULT_EVENT_TOPIC.to_string(),
            keep_alive_secs: 60,
            retry_delay_secs: 5,
            max_retry_attempts: 5,
        }
    }
}

impl MqttSubscriberConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
