//! Pure field mappings from network server records to backend and manifest
//! records.

use super::{LorawanConnection, LorawanDevice};
use chrono::{DateTime, Utc};
use common::domain::{
    ConnectionType, ConnectionUpdate, DeviceActivation, DeviceProfile, DeviceSnapshot,
    DeviceUpdate, EventTime, KeysUpdate,
};

/// Replaces whitespace in device names; the backend rejects it in identifiers
pub const NAME_PLACEHOLDER: char = '-';

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn replace_spaces(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() { NAME_PLACEHOLDER } else { c })
        .collect()
}

/// Combines seconds and nanoseconds into one floating-point epoch value,
/// then drops the sub-second part. None when out of chrono's range.
pub fn epoch_to_utc(time: EventTime) -> Option<DateTime<Utc>> {
    let total_seconds = time.seconds as f64 + f64::from(time.nanos) / 1e9;
    DateTime::from_timestamp(total_seconds.floor() as i64, 0)
}

pub fn format_timestamp(time: EventTime) -> Option<String> {
    epoch_to_utc(time).map(|utc| utc.format(TIMESTAMP_FORMAT).to_string())
}

pub fn connection_type(supports_otaa: bool) -> ConnectionType {
    if supports_otaa {
        ConnectionType::Otaa
    } else {
        ConnectionType::Abp
    }
}

/// Identifier the backend assigns to a new connection
pub fn connection_handle(node_vsn: &str, device_name: &str, deveui: &str) -> String {
    format!("{}-{}-{}", node_vsn, device_name, deveui)
}

pub fn device_update(device: &DeviceSnapshot) -> DeviceUpdate {
    DeviceUpdate {
        name: replace_spaces(&device.name),
        battery_level: device.device_status.map(|status| status.battery_level),
    }
}

pub fn connection_update(device: &DeviceSnapshot, profile: &DeviceProfile) -> ConnectionUpdate {
    ConnectionUpdate {
        connection_name: replace_spaces(&device.name),
        last_seen_at: device.last_seen_at.and_then(format_timestamp),
        margin: device.device_status.map(|status| status.margin),
        expected_uplink_interval_sec: profile.uplink_interval_secs,
        connection_type: connection_type(profile.supports_otaa),
    }
}

/// Session keys of an activated device; `app_key` is attached by the caller
/// for OTAA connections.
pub fn keys_update(activation: &DeviceActivation) -> KeysUpdate {
    KeysUpdate {
        network_key: activation.nwk_s_enc_key.clone(),
        app_session_key: activation.app_s_key.clone(),
        dev_address: activation.dev_addr.clone(),
        app_key: None,
    }
}

pub fn manifest_record(
    deveui: &str,
    device: &DeviceSnapshot,
    profile: &DeviceProfile,
) -> LorawanConnection {
    let name = replace_spaces(&device.name);
    LorawanConnection {
        connection_name: Some(name.clone()),
        created_at: None,
        last_seen_at: device.last_seen_at.and_then(format_timestamp),
        margin: device.device_status.map(|status| status.margin),
        expected_uplink_interval_sec: Some(profile.uplink_interval_secs),
        connection_type: Some(connection_type(profile.supports_otaa)),
        lorawan_device: Some(LorawanDevice {
            deveui: Some(deveui.to_string()),
            name: Some(name),
            battery_level: device
                .device_status
                .map(|status| f64::from(status.battery_level)),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DeviceStatus, MacVersion};

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            dev_eui: "7d1f5420e81235c1".to_string(),
            name: "SFM1x Sap Flow".to_string(),
            description: "sap flow meter".to_string(),
            device_profile_id: "cf2aec2f-03e1-4a60-a32c-0faeef5730d8".to_string(),
            last_seen_at: Some(EventTime {
                seconds: 1702496865,
                nanos: 558_000_000,
            }),
            device_status: Some(DeviceStatus {
                margin: 5,
                battery_level: 10.5,
            }),
        }
    }

    fn profile(supports_otaa: bool) -> DeviceProfile {
        DeviceProfile {
            id: "cf2aec2f-03e1-4a60-a32c-0faeef5730d8".to_string(),
            name: "SFM1x".to_string(),
            description: "ICT International SFM1x".to_string(),
            mac_version: MacVersion::Lorawan104,
            uplink_interval_secs: 3600,
            supports_otaa,
        }
    }

    #[test]
    fn test_replace_spaces() {
        assert_eq!(replace_spaces("SFM1x Sap Flow"), "SFM1x-Sap-Flow");
        assert_eq!(replace_spaces("tab\tand  double"), "tab-and--double");
        assert_eq!(replace_spaces("  padded "), "padded");
        assert_eq!(replace_spaces("plain"), "plain");
    }

    #[test]
    fn test_timestamp_truncates_subseconds() {
        let time = EventTime {
            seconds: 1702496865,
            nanos: 900_000_000,
        };
        assert_eq!(format_timestamp(time).as_deref(), Some("2023-12-13T19:47:45Z"));
    }

    #[test]
    fn test_timestamp_at_epoch() {
        let time = EventTime { seconds: 0, nanos: 0 };
        assert_eq!(format_timestamp(time).as_deref(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let time = EventTime {
            seconds: i64::MAX,
            nanos: 0,
        };
        assert_eq!(format_timestamp(time), None);
    }

    #[test]
    fn test_connection_type() {
        assert_eq!(connection_type(true), ConnectionType::Otaa);
        assert_eq!(connection_type(false), ConnectionType::Abp);
    }

    #[test]
    fn test_connection_handle() {
        assert_eq!(
            connection_handle("W030", "SFM1x-Sap-Flow", "7d1f5420e81235c1"),
            "W030-SFM1x-Sap-Flow-7d1f5420e81235c1"
        );
    }

    #[test]
    fn test_connection_update_fields() {
        let update = connection_update(&snapshot(), &profile(false));
        assert_eq!(update.connection_name, "SFM1x-Sap-Flow");
        assert_eq!(update.last_seen_at.as_deref(), Some("2023-12-13T19:47:45Z"));
        assert_eq!(update.margin, Some(5));
        assert_eq!(update.expected_uplink_interval_sec, 3600);
        assert_eq!(update.connection_type, ConnectionType::Abp);
    }

    #[test]
    fn test_device_without_status() {
        let mut device = snapshot();
        device.device_status = None;
        device.last_seen_at = None;

        let update = device_update(&device);
        assert_eq!(update.battery_level, None);

        let connection = connection_update(&device, &profile(true));
        assert_eq!(connection.margin, None);
        assert_eq!(connection.last_seen_at, None);
    }

    #[test]
    fn test_keys_update_leaves_app_key_to_caller() {
        let activation = DeviceActivation {
            dev_addr: "00aabbcc".to_string(),
            app_s_key: "apps".to_string(),
            nwk_s_enc_key: "nwks".to_string(),
        };
        let keys = keys_update(&activation);
        assert_eq!(keys.network_key, "nwks");
        assert_eq!(keys.app_session_key, "apps");
        assert_eq!(keys.dev_address, "00aabbcc");
        assert_eq!(keys.app_key, None);
    }

    #[test]
    fn test_manifest_record() {
        let record = manifest_record("7d1f5420e81235c1", &snapshot(), &profile(true));
        assert_eq!(record.connection_name.as_deref(), Some("SFM1x-Sap-Flow"));
        assert_eq!(record.connection_type, Some(ConnectionType::Otaa));
        assert_eq!(record.expected_uplink_interval_sec, Some(3600));

        let device = record.lorawan_device.unwrap();
        assert_eq!(device.deveui.as_deref(), Some("7d1f5420e81235c1"));
        assert_eq!(device.battery_level, Some(10.5));
        assert_eq!(device.hardware, None);
    }
}
