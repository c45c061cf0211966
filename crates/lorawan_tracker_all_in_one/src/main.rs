mod config;

use anyhow::Context;
use common::backend::RestBackendClient;
use common::chirpstack::ChirpstackClient;
use common::domain::{BackendClient, NetworkServerClient};
use common::telemetry::init_telemetry;
use config::ServiceConfig;
use lorawan_tracker::LorawanTracker;
use lorawan_tracker_runner::Runner;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&config.telemetry()) {
        eprintln!("Failed to initialize telemetry: {:#}", e);
        std::process::exit(1);
    }

    info!(
        node_vsn = %config.node_vsn,
        manifest_path = %config.manifest_path.display(),
        mqtt_broker_url = %config.mqtt_broker_url,
        chirpstack_api_interface = %config.chirpstack_api_interface,
        api_interface = %config.api_interface,
        "Starting lorawan-tracker service"
    );

    let (network_server, backend) =
        match tokio::time::timeout(config.startup_timeout(), initialize_clients(&config)).await {
            Ok(Ok(clients)) => clients,
            Ok(Err(e)) => {
                error!(error = ?e, "Failed to initialize clients");
                std::process::exit(1);
            }
            Err(_) => {
                error!(
                    timeout_secs = config.startup_timeout_secs,
                    "Timed out initializing clients"
                );
                std::process::exit(1);
            }
        };

    let tracker = LorawanTracker::new(network_server, backend, config.tracker());

    let runner = Runner::new()
        .with_app_process(tracker.into_runner_process())
        .with_closer_timeout(config.closer_timeout());

    if let Err(e) = runner.run().await {
        error!(error = ?e, "Application exiting with error");
        std::process::exit(1);
    }

    info!("Application exiting normally");
}

async fn initialize_clients(
    config: &ServiceConfig,
) -> anyhow::Result<(Arc<dyn NetworkServerClient>, Arc<dyn BackendClient>)> {
    let chirpstack = ChirpstackClient::connect(&config.chirpstack())
        .await
        .context("Failed to connect to ChirpStack")?;
    let backend =
        RestBackendClient::new(config.backend()).context("Failed to create backend client")?;

    Ok((Arc::new(chirpstack), Arc::new(backend)))
}
