use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Instant reported by the network server as whole seconds plus a
/// nanosecond fraction since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTime {
    pub seconds: i64,
    pub nanos: i32,
}

/// Radio status last reported by a device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    /// Demodulation margin in dB
    pub margin: i32,
    /// Battery level in percent
    pub battery_level: f32,
}

/// Device record as held by the network server
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub dev_eui: String,
    pub name: String,
    pub description: String,
    pub device_profile_id: String,
    /// None until the device has sent its first uplink
    pub last_seen_at: Option<EventTime>,
    /// None until the device has answered a status request
    pub device_status: Option<DeviceStatus>,
}

/// LoRaWAN MAC layer version a device profile is provisioned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MacVersion {
    Lorawan100,
    Lorawan101,
    Lorawan102,
    Lorawan103,
    Lorawan104,
    Lorawan110,
}

impl MacVersion {
    /// LoRaWAN 1.1 split the root key in two; older versions keep the
    /// application root key in the network key slot.
    pub fn has_separate_app_key(&self) -> bool {
        matches!(self, MacVersion::Lorawan110)
    }
}

/// Device profile as held by the network server
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub mac_version: MacVersion,
    pub uplink_interval_secs: u32,
    pub supports_otaa: bool,
}

/// Session material of an activated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceActivation {
    pub dev_addr: String,
    pub app_s_key: String,
    pub nwk_s_enc_key: String,
}

/// Client for the LoRaWAN network server holding device telemetry and keys
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NetworkServerClient: Send + Sync {
    /// Get a device and its last reported status
    async fn get_device(&self, dev_eui: &str) -> DomainResult<DeviceSnapshot>;

    /// Get a device profile by ID
    async fn get_device_profile(&self, profile_id: &str) -> DomainResult<DeviceProfile>;

    /// Get the session material of a device, None when it has not activated yet
    async fn get_device_activation(&self, dev_eui: &str) -> DomainResult<Option<DeviceActivation>>;

    /// Get the application root key of an OTAA device
    async fn get_device_app_key(
        &self,
        dev_eui: &str,
        mac_version: MacVersion,
    ) -> DomainResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lorawan_1_1_has_separate_app_key() {
        assert!(MacVersion::Lorawan110.has_separate_app_key());
        assert!(!MacVersion::Lorawan104.has_separate_app_key());
        assert!(!MacVersion::Lorawan100.has_separate_app_key());
    }
}
