use crate::chirpstack::proto;
use crate::domain::{
    DeviceActivation, DeviceProfile, DeviceSnapshot, DeviceStatus, DomainError, DomainResult,
    EventTime, MacVersion,
};

/// Convert `common.MacVersion` enum values
pub fn mac_version_from_proto(value: i32) -> DomainResult<MacVersion> {
    match value {
        0 => Ok(MacVersion::Lorawan100),
        1 => Ok(MacVersion::Lorawan101),
        2 => Ok(MacVersion::Lorawan102),
        3 => Ok(MacVersion::Lorawan103),
        4 => Ok(MacVersion::Lorawan104),
        5 => Ok(MacVersion::Lorawan110),
        other => Err(DomainError::NetworkServer(format!(
            "Unknown MAC version: {}",
            other
        ))),
    }
}

pub fn device_from_proto(response: proto::GetDeviceResponse) -> DomainResult<DeviceSnapshot> {
    let device = response
        .device
        .ok_or_else(|| DomainError::NetworkServer("GetDevice response without device".to_string()))?;

    Ok(DeviceSnapshot {
        dev_eui: device.dev_eui,
        name: device.name,
        description: device.description,
        device_profile_id: device.device_profile_id,
        last_seen_at: response.last_seen_at.map(|ts| EventTime {
            seconds: ts.seconds,
            nanos: ts.nanos,
        }),
        device_status: response.device_status.map(|status| DeviceStatus {
            margin: status.margin,
            battery_level: status.battery_level,
        }),
    })
}

pub fn device_profile_from_proto(
    response: proto::GetDeviceProfileResponse,
) -> DomainResult<DeviceProfile> {
    let profile = response.device_profile.ok_or_else(|| {
        DomainError::NetworkServer("GetDeviceProfile response without device profile".to_string())
    })?;

    Ok(DeviceProfile {
        mac_version: mac_version_from_proto(profile.mac_version)?,
        id: profile.id,
        name: profile.name,
        description: profile.description,
        uplink_interval_secs: profile.uplink_interval,
        supports_otaa: profile.supports_otaa,
    })
}

pub fn device_activation_from_proto(
    response: proto::GetDeviceActivationResponse,
) -> Option<DeviceActivation> {
    response.device_activation.map(|activation| DeviceActivation {
        dev_addr: activation.dev_addr,
        app_s_key: activation.app_s_key,
        nwk_s_enc_key: activation.nwk_s_enc_key,
    })
}

/// Pick the application root key for the given MAC version
pub fn app_key_from_proto(
    response: proto::GetDeviceKeysResponse,
    mac_version: MacVersion,
) -> DomainResult<String> {
    let keys = response
        .device_keys
        .ok_or_else(|| DomainError::NetworkServer("GetKeys response without device keys".to_string()))?;

    if mac_version.has_separate_app_key() {
        Ok(keys.app_key)
    } else {
        Ok(keys.nwk_key)
    }
}
