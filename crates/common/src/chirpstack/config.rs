use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ChirpStack gRPC API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpstackConfig {
    /// host:port of the API, with or without an http(s) scheme
    pub api_interface: String,
    pub account_email: String,
    pub account_password: String,
    pub connect_timeout_secs: u64,
}

impl Default for ChirpstackConfig {
    fn default() -> Self {
        Self {
            api_interface: "wes-chirpstack-server:8080".to_string(),
            account_email: "admin".to_string(),
            account_password: "admin".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl ChirpstackConfig {
    pub fn endpoint_url(&self) -> String {
        if self.api_interface.starts_with("http://") || self.api_interface.starts_with("https://") {
            self.api_interface.clone()
        } else {
            format!("http://{}", self.api_interface)
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_adds_scheme() {
        let config = ChirpstackConfig {
            api_interface: "localhost:8080".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "http://localhost:8080");
    }

    #[test]
    fn test_endpoint_url_keeps_scheme() {
        let config = ChirpstackConfig {
            api_interface: "https://chirpstack.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "https://chirpstack.example.com");
    }
}
