mod subscriber;
mod subscriber_config;
mod topic;

pub use subscriber::run_mqtt_subscriber;
pub use subscriber_config::*;
pub use topic::{parse_topic, ParsedTopic, UPLINK_EVENT};
