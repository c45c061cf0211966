use crate::backend::config::BackendConfig;
use crate::domain::{
    ApiResponse, BackendClient, ConnectionUpdate, DeviceUpdate, DomainError, DomainResult,
    KeysUpdate, NewConnection, NewDevice, NewHardware, NewKeys,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, error, instrument};
use url::Url;

/// HTTP verbs used against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

/// REST implementation of BackendClient
#[derive(Clone)]
pub struct RestBackendClient {
    http: reqwest::Client,
    base_url: Url,
    auth_header: String,
    config: BackendConfig,
}

impl RestBackendClient {
    pub fn new(config: BackendConfig) -> DomainResult<Self> {
        let base_url = Url::parse(&config.api_interface).map_err(|e| {
            DomainError::InvalidConfig(format!(
                "Invalid API interface {}: {}",
                config.api_interface, e
            ))
        })?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DomainError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            auth_header: format!("node_auth {}", config.node_token),
            config,
        })
    }

    pub fn device_endpoint(&self, deveui: &str) -> String {
        format!("{}{}/", self.config.lorawan_device_router, deveui)
    }

    pub fn connection_endpoint(&self, deveui: &str) -> String {
        format!(
            "{}{}/{}/",
            self.config.lorawan_connection_router, self.config.node_vsn, deveui
        )
    }

    pub fn keys_endpoint(&self, deveui: &str) -> String {
        format!(
            "{}{}/{}/",
            self.config.lorawan_key_router, self.config.node_vsn, deveui
        )
    }

    pub fn hardware_endpoint(&self, hw_model: &str) -> String {
        format!("{}{}/", self.config.sensor_hardware_router, hw_model)
    }

    /// Resolve an endpoint against the API base URL
    pub fn resolve(&self, endpoint: &str) -> DomainResult<Url> {
        self.base_url.join(endpoint).map_err(|e| DomainError::Backend {
            endpoint: endpoint.to_string(),
            message: format!("invalid endpoint: {}", e),
        })
    }

    /// Send a request and classify the response
    ///
    /// Transport failures are returned as errors; HTTP error statuses are not.
    async fn call_api(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> DomainResult<ApiResponse> {
        let url = self.resolve(endpoint)?;

        let request = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Patch => self.http.patch(url),
        }
        .header(AUTHORIZATION, &self.auth_header);

        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };

        let response = request.send().await.map_err(|e| DomainError::Backend {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| DomainError::Backend {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

            let body = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).map_err(|e| DomainError::Backend {
                    endpoint: endpoint.to_string(),
                    message: format!("invalid JSON body: {}", e),
                })?
            };

            debug!(endpoint, status = status.as_u16(), "backend call succeeded");
            return Ok(ApiResponse::Found(body));
        }

        if status == StatusCode::NOT_FOUND {
            debug!(endpoint, "backend record not found");
            return Ok(ApiResponse::NotFound);
        }

        let detail = response.text().await.ok().filter(|text| !text.is_empty());
        error!(
            endpoint,
            method = ?method,
            status = status.as_u16(),
            detail = detail.as_deref().unwrap_or(""),
            "HTTP error from backend"
        );

        Ok(ApiResponse::Error {
            status: status.as_u16(),
            detail,
        })
    }
}

fn to_body<T: Serialize>(endpoint: &str, value: &T) -> DomainResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| DomainError::Backend {
        endpoint: endpoint.to_string(),
        message: format!("failed to encode body: {}", e),
    })
}

#[async_trait]
impl BackendClient for RestBackendClient {
    #[instrument(skip(self))]
    async fn get_device(&self, deveui: &str) -> DomainResult<ApiResponse> {
        let endpoint = self.device_endpoint(deveui);
        self.call_api(HttpMethod::Get, &endpoint, None).await
    }

    #[instrument(skip_all, fields(deveui = %device.deveui))]
    async fn create_device(&self, device: &NewDevice) -> DomainResult<ApiResponse> {
        let endpoint = self.config.lorawan_device_router.clone();
        let body = to_body(&endpoint, device)?;
        self.call_api(HttpMethod::Post, &endpoint, Some(body)).await
    }

    #[instrument(skip(self, update))]
    async fn update_device(&self, deveui: &str, update: &DeviceUpdate) -> DomainResult<ApiResponse> {
        let endpoint = self.device_endpoint(deveui);
        let body = to_body(&endpoint, update)?;
        self.call_api(HttpMethod::Patch, &endpoint, Some(body)).await
    }

    #[instrument(skip_all, fields(deveui = %connection.lorawan_device))]
    async fn create_connection(&self, connection: &NewConnection) -> DomainResult<ApiResponse> {
        let endpoint = self.config.lorawan_connection_router.clone();
        let body = to_body(&endpoint, connection)?;
        self.call_api(HttpMethod::Post, &endpoint, Some(body)).await
    }

    #[instrument(skip(self, update))]
    async fn update_connection(
        &self,
        deveui: &str,
        update: &ConnectionUpdate,
    ) -> DomainResult<ApiResponse> {
        let endpoint = self.connection_endpoint(deveui);
        let body = to_body(&endpoint, update)?;
        self.call_api(HttpMethod::Patch, &endpoint, Some(body)).await
    }

    #[instrument(skip_all, fields(connection = %keys.lorawan_connection))]
    async fn create_keys(&self, keys: &NewKeys) -> DomainResult<ApiResponse> {
        let endpoint = self.config.lorawan_key_router.clone();
        let body = to_body(&endpoint, keys)?;
        self.call_api(HttpMethod::Post, &endpoint, Some(body)).await
    }

    #[instrument(skip(self, update))]
    async fn update_keys(&self, deveui: &str, update: &KeysUpdate) -> DomainResult<ApiResponse> {
        let endpoint = self.keys_endpoint(deveui);
        let body = to_body(&endpoint, update)?;
        self.call_api(HttpMethod::Patch, &endpoint, Some(body)).await
    }

    #[instrument(skip(self))]
    async fn get_hardware(&self, hw_model: &str) -> DomainResult<ApiResponse> {
        let endpoint = self.hardware_endpoint(hw_model);
        self.call_api(HttpMethod::Get, &endpoint, None).await
    }

    #[instrument(skip_all, fields(hw_model = %hardware.hw_model))]
    async fn create_hardware(&self, hardware: &NewHardware) -> DomainResult<ApiResponse> {
        let endpoint = self.config.sensor_hardware_router.clone();
        let body = to_body(&endpoint, hardware)?;
        self.call_api(HttpMethod::Post, &endpoint, Some(body)).await
    }
}
