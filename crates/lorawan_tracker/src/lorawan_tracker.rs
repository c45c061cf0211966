use crate::domain::{Tracker, TrackerConfig, UplinkHandler};
use crate::mqtt::{run_mqtt_subscriber, MqttSubscriberConfig};
use common::domain::{BackendClient, NetworkServerClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LorawanTrackerConfig {
    pub tracker: TrackerConfig,
    pub mqtt: MqttSubscriberConfig,
}

/// Uplink subscriber wired to the reconciliation workflow
pub struct LorawanTracker {
    handler: Arc<dyn UplinkHandler>,
    mqtt_config: MqttSubscriberConfig,
}

impl LorawanTracker {
    pub fn new(
        network_server: Arc<dyn NetworkServerClient>,
        backend: Arc<dyn BackendClient>,
        config: LorawanTrackerConfig,
    ) -> Self {
        debug!(
            node_vsn = %config.tracker.node_vsn,
            manifest_path = %config.tracker.manifest_path.display(),
            "initializing lorawan tracker"
        );

        let tracker = Tracker::new(network_server, backend, config.tracker);

        Self {
            handler: Arc::new(tracker),
            mqtt_config: config.mqtt,
        }
    }

    #[allow(clippy::type_complexity)]
    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
            > + Send,
    > {
        Box::new({
            let handler = self.handler;
            let mqtt_config = self.mqtt_config;
            move |ctx| {
                Box::pin(async move {
                    run_mqtt_subscriber(mqtt_config, handler, ctx).await?;
                    Ok(())
                })
            }
        })
    }
}
