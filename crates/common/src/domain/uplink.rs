use crate::domain::result::{DomainError, DomainResult};
use serde::Deserialize;

/// Device identification carried by every network-server event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub dev_eui: String,
    pub device_profile_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub device_profile_name: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub tenant_id: String,
}

/// Per-gateway reception metadata of an uplink
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxInfo {
    #[serde(default)]
    pub gateway_id: String,
    #[serde(default)]
    pub rssi: i32,
    #[serde(default)]
    pub snr: f32,
}

/// Uplink event published by the network server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkEvent {
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub rx_info: Vec<RxInfo>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub f_cnt: Option<u32>,
}

impl UplinkEvent {
    /// Parse a JSON uplink payload
    pub fn parse(payload: &[u8]) -> DomainResult<Self> {
        let event: UplinkEvent = serde_json::from_slice(payload)
            .map_err(|e| DomainError::InvalidMessage(e.to_string()))?;

        if event.device_info.dev_eui.trim().is_empty() {
            return Err(DomainError::InvalidMessage(
                "deviceInfo.devEui cannot be empty".to_string(),
            ));
        }

        Ok(event)
    }

    /// Split into reception metadata and device identification
    pub fn into_parts(self) -> (Vec<RxInfo>, DeviceInfo) {
        (self.rx_info, self.device_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPLINK: &str = r#"{
        "deduplicationId": "3ac7e3c4-4401-4b8d-9386-a5c902f9202d",
        "time": "2023-12-13T19:47:45.355+00:00",
        "deviceInfo": {
            "tenantId": "52f14cd4-c6f1-4fbd-8f87-4025e1d49242",
            "tenantName": "ChirpStack",
            "applicationId": "ac81e18b-1925-47f9-839a-27d999a8af55",
            "applicationName": "Sap Flow",
            "deviceProfileId": "cf2aec2f-03e1-4a60-a32c-0faeef5730d8",
            "deviceProfileName": "SFM1x",
            "deviceName": "SFM1x Sap Flow",
            "devEui": "7d1f5420e81235c1",
            "tags": {}
        },
        "devAddr": "00fb5ab4",
        "fCnt": 12,
        "fPort": 1,
        "rxInfo": [
            {"gatewayId": "a84041fffe1e2d39", "rssi": -57, "snr": 10.5, "crcStatus": "CRC_OK"}
        ]
    }"#;

    #[test]
    fn test_parse_uplink() {
        let event = UplinkEvent::parse(UPLINK.as_bytes()).unwrap();
        assert_eq!(event.device_info.dev_eui, "7d1f5420e81235c1");
        assert_eq!(event.device_info.device_profile_id, "cf2aec2f-03e1-4a60-a32c-0faeef5730d8");
        assert_eq!(event.device_info.device_name, "SFM1x Sap Flow");
        assert_eq!(event.f_cnt, Some(12));

        let (rx_info, device_info) = event.into_parts();
        assert_eq!(rx_info.len(), 1);
        assert_eq!(rx_info[0].gateway_id, "a84041fffe1e2d39");
        assert_eq!(rx_info[0].rssi, -57);
        assert_eq!(device_info.application_id, "ac81e18b-1925-47f9-839a-27d999a8af55");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let result = UplinkEvent::parse(b"{not json");
        assert!(matches!(result, Err(DomainError::InvalidMessage(_))));
    }

    #[test]
    fn test_parse_rejects_missing_device_info() {
        let result = UplinkEvent::parse(br#"{"fCnt": 1, "rxInfo": []}"#);
        assert!(matches!(result, Err(DomainError::InvalidMessage(_))));
    }

    #[test]
    fn test_parse_rejects_empty_dev_eui() {
        let payload = br#"{"deviceInfo": {"devEui": " ", "deviceProfileId": "p1"}}"#;
        let result = UplinkEvent::parse(payload);
        assert!(matches!(result, Err(DomainError::InvalidMessage(_))));
    }
}
