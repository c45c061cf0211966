use serde::{Deserialize, Serialize};
use std::fmt;

/// LoRaWAN join mode recorded on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "OTAA")]
    Otaa,
    #[serde(rename = "ABP")]
    Abp,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Otaa => "OTAA",
            ConnectionType::Abp => "ABP",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_type_wire_names() {
        assert_eq!(serde_json::to_string(&ConnectionType::Otaa).unwrap(), "\"OTAA\"");
        assert_eq!(serde_json::to_string(&ConnectionType::Abp).unwrap(), "\"ABP\"");

        let parsed: ConnectionType = serde_json::from_str("\"ABP\"").unwrap();
        assert_eq!(parsed, ConnectionType::Abp);
    }

    #[test]
    fn test_unknown_connection_type_rejected() {
        assert!(serde_json::from_str::<ConnectionType>("\"otaa\"").is_err());
    }
}
