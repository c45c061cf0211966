use super::transform::{self, connection_handle, replace_spaces};
use super::{Hardware, ManifestStore, TrackerConfig, UplinkHandler};
use async_trait::async_trait;
use common::domain::{
    ApiResponse, BackendClient, ConnectionType, DeviceActivation, DeviceInfo, DeviceProfile,
    DeviceSnapshot, DomainResult, KeysUpdate, NetworkServerClient, NewConnection, NewDevice,
    NewHardware, NewKeys, UplinkEvent,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Capability attached to hardware records created for new devices
pub const LORAWAN_CAPABILITY: &str = "lorawan";

/// Which reconciliation path an uplink took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Device was already in the manifest; all records updated
    UpdatedKnownDevice,
    /// Device existed in the backend only; linked to this node
    LinkedBackendDevice { connection: Option<String> },
    /// Device was unknown everywhere; registered in the backend
    RegisteredNewDevice { connection: Option<String> },
    /// Payload could not be parsed
    Dropped,
}

/// Keeps backend records and the node manifest in sync with the network
/// server, one uplink at a time.
pub struct Tracker {
    network_server: Arc<dyn NetworkServerClient>,
    backend: Arc<dyn BackendClient>,
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(
        network_server: Arc<dyn NetworkServerClient>,
        backend: Arc<dyn BackendClient>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            network_server,
            backend,
            config,
        }
    }

    /// Parse a raw uplink and reconcile its device. Malformed payloads are
    /// logged and dropped.
    pub async fn on_message(&self, payload: &[u8]) -> DomainResult<ReconcileOutcome> {
        debug!(payload = %String::from_utf8_lossy(payload), "uplink received");

        let event = match UplinkEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "message did not parse correctly, dropping");
                return Ok(ReconcileOutcome::Dropped);
            }
        };

        let (_rx_info, device_info) = event.into_parts();
        self.reconcile(&device_info).await
    }

    #[instrument(skip_all, fields(dev_eui = %device_info.dev_eui))]
    pub async fn reconcile(&self, device_info: &DeviceInfo) -> DomainResult<ReconcileOutcome> {
        let mut manifest = ManifestStore::load(&self.config.manifest_path)?;
        let dev_eui = device_info.dev_eui.as_str();

        let device = self.network_server.get_device(dev_eui).await?;
        let profile = self
            .network_server
            .get_device_profile(&device_info.device_profile_id)
            .await?;
        let activation = self.network_server.get_device_activation(dev_eui).await?;

        if manifest.find_device(dev_eui) {
            info!("device found in manifest, updating records");
            self.update_device(dev_eui, &device).await?;
            self.update_connection(dev_eui, &device, &profile).await?;
            self.update_keys(dev_eui, activation.as_ref(), &profile)
                .await?;
            manifest.upsert_connection(&transform::manifest_record(dev_eui, &device, &profile));
            return Ok(ReconcileOutcome::UpdatedKnownDevice);
        }

        let backend_device = self.backend.get_device(dev_eui).await?;
        if record_exists("lorawan device", dev_eui, &backend_device) {
            info!("device found in backend, linking to node");
            self.update_device(dev_eui, &device).await?;
            let connection = self.create_connection(dev_eui, &device, &profile).await?;
            if let Some(handle) = &connection {
                self.create_keys(dev_eui, handle, activation.as_ref(), &profile)
                    .await?;
            }

            let mut record = transform::manifest_record(dev_eui, &device, &profile);
            if let (Some(hw_model), Some(lorawan_device)) = (
                hardware_model(&backend_device),
                record.lorawan_device.as_mut(),
            ) {
                lorawan_device.hardware = Some(Hardware {
                    hw_model: Some(hw_model),
                    ..Default::default()
                });
            }
            manifest.upsert_connection(&record);

            return Ok(ReconcileOutcome::LinkedBackendDevice { connection });
        }

        info!("device unknown, registering in backend");
        let hw_model = self.ensure_hardware(&profile).await?;
        self.create_device(dev_eui, &device, hw_model).await?;
        let connection = self.create_connection(dev_eui, &device, &profile).await?;
        if let Some(handle) = &connection {
            self.create_keys(dev_eui, handle, activation.as_ref(), &profile)
                .await?;
        }
        warn!("manifest record for newly registered device deferred until its hardware is known");

        Ok(ReconcileOutcome::RegisteredNewDevice { connection })
    }

    async fn update_device(&self, dev_eui: &str, device: &DeviceSnapshot) -> DomainResult<()> {
        let response = self
            .backend
            .update_device(dev_eui, &transform::device_update(device))
            .await?;
        check_write("lorawan device", dev_eui, &response);
        Ok(())
    }

    async fn create_device(
        &self,
        dev_eui: &str,
        device: &DeviceSnapshot,
        hw_model: String,
    ) -> DomainResult<()> {
        let new_device = NewDevice {
            deveui: dev_eui.to_string(),
            name: replace_spaces(&device.name),
            battery_level: device.device_status.map(|status| status.battery_level),
            hardware: hw_model,
        };
        let response = self.backend.create_device(&new_device).await?;
        check_write("lorawan device", dev_eui, &response);
        Ok(())
    }

    async fn update_connection(
        &self,
        dev_eui: &str,
        device: &DeviceSnapshot,
        profile: &DeviceProfile,
    ) -> DomainResult<()> {
        let response = self
            .backend
            .update_connection(dev_eui, &transform::connection_update(device, profile))
            .await?;
        check_write("lorawan connection", dev_eui, &response);
        Ok(())
    }

    /// Returns the new connection's handle, or None when the backend did not
    /// create it.
    async fn create_connection(
        &self,
        dev_eui: &str,
        device: &DeviceSnapshot,
        profile: &DeviceProfile,
    ) -> DomainResult<Option<String>> {
        let fields = transform::connection_update(device, profile);
        let handle = connection_handle(&self.config.node_vsn, &fields.connection_name, dev_eui);
        let new_connection = NewConnection {
            node: self.config.node_vsn.clone(),
            lorawan_device: dev_eui.to_string(),
            fields,
        };

        let response = self.backend.create_connection(&new_connection).await?;
        if !check_write("lorawan connection", dev_eui, &response) {
            return Ok(None);
        }

        debug!(connection = %handle, "lorawan connection created");
        Ok(Some(handle))
    }

    async fn update_keys(
        &self,
        dev_eui: &str,
        activation: Option<&DeviceActivation>,
        profile: &DeviceProfile,
    ) -> DomainResult<()> {
        let Some(keys) = self.session_keys(dev_eui, activation, profile).await? else {
            return Ok(());
        };

        let response = self.backend.update_keys(dev_eui, &keys).await?;
        check_write("lorawan keys", dev_eui, &response);
        Ok(())
    }

    async fn create_keys(
        &self,
        dev_eui: &str,
        connection: &str,
        activation: Option<&DeviceActivation>,
        profile: &DeviceProfile,
    ) -> DomainResult<()> {
        let Some(keys) = self.session_keys(dev_eui, activation, profile).await? else {
            return Ok(());
        };

        let new_keys = NewKeys {
            lorawan_connection: connection.to_string(),
            keys,
        };
        let response = self.backend.create_keys(&new_keys).await?;
        check_write("lorawan keys", dev_eui, &response);
        Ok(())
    }

    /// Session keys for an activated device. OTAA connections also carry the
    /// application key, fetched for the profile's MAC version.
    async fn session_keys(
        &self,
        dev_eui: &str,
        activation: Option<&DeviceActivation>,
        profile: &DeviceProfile,
    ) -> DomainResult<Option<KeysUpdate>> {
        let Some(activation) = activation else {
            info!("device has no activation yet, skipping keys");
            return Ok(None);
        };

        let mut keys = transform::keys_update(activation);
        if transform::connection_type(profile.supports_otaa) == ConnectionType::Otaa {
            let app_key = self
                .network_server
                .get_device_app_key(dev_eui, profile.mac_version)
                .await?;
            keys.app_key = Some(app_key);
        }

        Ok(Some(keys))
    }

    /// Hardware model for a device profile, creating the sensor hardware
    /// record when the backend does not have it yet.
    async fn ensure_hardware(&self, profile: &DeviceProfile) -> DomainResult<String> {
        let hw_model = replace_spaces(&profile.name);

        let response = self.backend.get_hardware(&hw_model).await?;
        if record_exists("sensor hardware", &hw_model, &response) {
            return Ok(hw_model);
        }

        let hardware = NewHardware {
            hardware: profile.name.clone(),
            hw_model: hw_model.clone(),
            description: profile.description.clone(),
            capabilities: vec![LORAWAN_CAPABILITY.to_string()],
        };
        let response = self.backend.create_hardware(&hardware).await?;
        check_write("sensor hardware", &hw_model, &response);

        Ok(hw_model)
    }
}

#[async_trait]
impl UplinkHandler for Tracker {
    async fn handle_uplink(&self, payload: &[u8]) -> DomainResult<ReconcileOutcome> {
        self.on_message(payload).await
    }
}

/// Existence check on a backend lookup. Statuses other than 404 are logged
/// and treated as not found.
pub fn record_exists(resource: &str, key: &str, response: &ApiResponse) -> bool {
    match response {
        ApiResponse::Found(_) => true,
        ApiResponse::NotFound => {
            debug!(resource, key, "record not found");
            false
        }
        ApiResponse::Error { status, detail } => {
            error!(
                resource,
                key,
                status = *status,
                detail = detail.as_deref().unwrap_or_default(),
                "unexpected status code"
            );
            false
        }
    }
}

fn check_write(resource: &str, key: &str, response: &ApiResponse) -> bool {
    if response.is_found() {
        return true;
    }
    warn!(resource, key, response = ?response, "backend write was not applied");
    false
}

/// Hardware model referenced by a backend device record, either as a plain
/// model string or a nested hardware object.
fn hardware_model(response: &ApiResponse) -> Option<String> {
    let ApiResponse::Found(body) = response else {
        return None;
    };
    let hardware = body.get("hardware")?;
    hardware
        .as_str()
        .or_else(|| hardware.get("hw_model").and_then(|model| model.as_str()))
        .map(str::to_string)
}
