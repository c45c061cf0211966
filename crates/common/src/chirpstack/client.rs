use crate::chirpstack::config::ChirpstackConfig;
use crate::chirpstack::conversions::{
    app_key_from_proto, device_activation_from_proto, device_from_proto,
    device_profile_from_proto,
};
use crate::chirpstack::proto;
use crate::domain::{
    DeviceActivation, DeviceProfile, DeviceSnapshot, DomainError, DomainResult, MacVersion,
    NetworkServerClient,
};
use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};
use tracing::{debug, info, instrument};

/// ChirpStack implementation of NetworkServerClient
///
/// Logs in once with the configured account and sends the issued JWT with every call.
#[derive(Clone)]
pub struct ChirpstackClient {
    channel: Channel,
    auth_header: MetadataValue<Ascii>,
}

impl ChirpstackClient {
    /// Connect to the API and log in
    ///
    /// Fails when the server is unreachable or rejects the credentials.
    pub async fn connect(config: &ChirpstackConfig) -> DomainResult<Self> {
        let url = config.endpoint_url();
        info!(url = %url, "connecting to ChirpStack");

        let channel = Endpoint::from_shared(url.clone())
            .map_err(|e| DomainError::InvalidConfig(format!("Invalid ChirpStack URL {}: {}", url, e)))?
            .connect_timeout(config.connect_timeout())
            .connect()
            .await
            .map_err(|e| DomainError::NetworkServer(format!("Failed to connect to {}: {}", url, e)))?;

        let login = proto::LoginRequest {
            email: config.account_email.clone(),
            password: config.account_password.clone(),
        };

        let response: proto::LoginResponse =
            unary(channel.clone(), proto::LOGIN_PATH, Request::new(login))
                .await
                .map_err(|status| match status.code() {
                    Code::Unauthenticated | Code::PermissionDenied => {
                        DomainError::NetworkServerAuth(status.message().to_string())
                    }
                    _ => DomainError::NetworkServerAuth(status.to_string()),
                })?;

        let auth_header = format!("Bearer {}", response.jwt)
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| DomainError::NetworkServerAuth(format!("Invalid token: {}", e)))?;

        info!("logged in to ChirpStack");
        Ok(Self {
            channel,
            auth_header,
        })
    }

    fn authorized<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request
            .metadata_mut()
            .insert("authorization", self.auth_header.clone());
        request
    }

    async fn call<Req, Resp>(&self, path: &'static str, message: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        unary(self.channel.clone(), path, self.authorized(message)).await
    }
}

/// Issue a unary call the way generated tonic clients do
async fn unary<Req, Resp>(
    channel: Channel,
    path: &'static str,
    request: Request<Req>,
) -> Result<Resp, Status>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    let mut grpc = Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| Status::unknown(format!("Service was not ready: {}", e)))?;

    let codec: ProstCodec<Req, Resp> = ProstCodec::default();
    let response = grpc
        .unary(request, PathAndQuery::from_static(path), codec)
        .await?;

    Ok(response.into_inner())
}

fn status_error(operation: &str, key: &str, status: Status) -> DomainError {
    DomainError::NetworkServer(format!(
        "{} for {} failed: {} ({:?})",
        operation,
        key,
        status.message(),
        status.code()
    ))
}

#[async_trait]
impl NetworkServerClient for ChirpstackClient {
    #[instrument(skip(self))]
    async fn get_device(&self, dev_eui: &str) -> DomainResult<DeviceSnapshot> {
        let request = proto::GetDeviceRequest {
            dev_eui: dev_eui.to_string(),
        };

        let response: proto::GetDeviceResponse = self
            .call(proto::GET_DEVICE_PATH, request)
            .await
            .map_err(|status| status_error("GetDevice", dev_eui, status))?;

        debug!("fetched device");
        device_from_proto(response)
    }

    #[instrument(skip(self))]
    async fn get_device_profile(&self, profile_id: &str) -> DomainResult<DeviceProfile> {
        let request = proto::GetDeviceProfileRequest {
            id: profile_id.to_string(),
        };

        let response: proto::GetDeviceProfileResponse = self
            .call(proto::GET_DEVICE_PROFILE_PATH, request)
            .await
            .map_err(|status| status_error("GetDeviceProfile", profile_id, status))?;

        debug!("fetched device profile");
        device_profile_from_proto(response)
    }

    #[instrument(skip(self))]
    async fn get_device_activation(&self, dev_eui: &str) -> DomainResult<Option<DeviceActivation>> {
        let request = proto::GetDeviceActivationRequest {
            dev_eui: dev_eui.to_string(),
        };

        match self
            .call::<_, proto::GetDeviceActivationResponse>(proto::GET_DEVICE_ACTIVATION_PATH, request)
            .await
        {
            Ok(response) => Ok(device_activation_from_proto(response)),
            Err(status) if status.code() == Code::NotFound => {
                debug!("device has no activation");
                Ok(None)
            }
            Err(status) => Err(status_error("GetDeviceActivation", dev_eui, status)),
        }
    }

    #[instrument(skip(self))]
    async fn get_device_app_key(
        &self,
        dev_eui: &str,
        mac_version: MacVersion,
    ) -> DomainResult<String> {
        let request = proto::GetDeviceKeysRequest {
            dev_eui: dev_eui.to_string(),
        };

        let response: proto::GetDeviceKeysResponse = self
            .call(proto::GET_DEVICE_KEYS_PATH, request)
            .await
            .map_err(|status| status_error("GetDeviceKeys", dev_eui, status))?;

        app_key_from_proto(response, mac_version)
    }
}
