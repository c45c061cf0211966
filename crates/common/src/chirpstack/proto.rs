//! Subset of the ChirpStack v4 `api` protobuf messages used by the tracker.
//!
//! Only the fields the tracker reads are declared; prost skips the rest on decode.

#[derive(Clone, PartialEq, prost::Message)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub email: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub jwt: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Device {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(string, tag = "4")]
    pub application_id: String,
    #[prost(string, tag = "5")]
    pub device_profile_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceStatus {
    #[prost(int32, tag = "1")]
    pub margin: i32,
    #[prost(bool, tag = "2")]
    pub external_power_source: bool,
    #[prost(float, tag = "3")]
    pub battery_level: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceResponse {
    #[prost(message, optional, tag = "1")]
    pub device: Option<Device>,
    #[prost(message, optional, tag = "4")]
    pub last_seen_at: Option<prost_types::Timestamp>,
    #[prost(message, optional, tag = "5")]
    pub device_status: Option<DeviceStatus>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceProfileRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceProfile {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub name: String,
    /// `common.MacVersion`
    #[prost(int32, tag = "5")]
    pub mac_version: i32,
    #[prost(uint32, tag = "11")]
    pub uplink_interval: u32,
    #[prost(bool, tag = "13")]
    pub supports_otaa: bool,
    #[prost(string, tag = "26")]
    pub description: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceProfileResponse {
    #[prost(message, optional, tag = "1")]
    pub device_profile: Option<DeviceProfile>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceActivationRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceActivation {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
    #[prost(string, tag = "2")]
    pub dev_addr: String,
    #[prost(string, tag = "3")]
    pub app_s_key: String,
    #[prost(string, tag = "4")]
    pub nwk_s_enc_key: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceActivationResponse {
    #[prost(message, optional, tag = "1")]
    pub device_activation: Option<DeviceActivation>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceKeysRequest {
    #[prost(string, tag = "1")]
    pub dev_eui: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceKeys {
    #[prost(string, tag = "1")]
    pub nwk_key: String,
    #[prost(string, tag = "2")]
    pub app_key: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetDeviceKeysResponse {
    #[prost(message, optional, tag = "1")]
    pub device_keys: Option<DeviceKeys>,
}

pub const LOGIN_PATH: &str = "/api.InternalService/Login";
pub const GET_DEVICE_PATH: &str = "/api.DeviceService/Get";
pub const GET_DEVICE_ACTIVATION_PATH: &str = "/api.DeviceService/GetActivation";
pub const GET_DEVICE_KEYS_PATH: &str = "/api.DeviceService/GetKeys";
pub const GET_DEVICE_PROFILE_PATH: &str = "/api.DeviceProfileService/Get";
