use crate::domain::UplinkHandler;
use crate::mqtt::{parse_topic, MqttSubscriberConfig};
use common::domain::{DomainError, DomainResult};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument, Span};

/// Why a broker session ended
enum SessionError {
    /// Broker or connection failure; the session is retried
    Broker(DomainError),
    /// Handler failure; the subscriber stops
    Fatal(DomainError),
}

/// Run the MQTT subscriber until shutdown
///
/// Subscribes to the configured event topic and hands every uplink to
/// `handler`, one message at a time. Broker errors are retried up to
/// `max_retry_attempts` times in a row; handler errors end the subscriber.
#[instrument(
    name = "mqtt_subscriber",
    skip_all,
    fields(
        broker_url = %config.broker_url,
        topic = %config.topic,
    )
)]
pub async fn run_mqtt_subscriber(
    config: MqttSubscriberConfig,
    handler: Arc<dyn UplinkHandler>,
    shutdown_token: CancellationToken,
) -> DomainResult<()> {
    info!("starting MQTT subscriber");

    let mut retry_count = 0;

    loop {
        if shutdown_token.is_cancelled() {
            debug!("MQTT subscriber cancelled before connection");
            break;
        }

        match run_mqtt_connection(&config, &shutdown_token, &handler, &mut retry_count).await {
            Ok(()) => {
                debug!("MQTT subscriber stopped cleanly");
                break;
            }
            Err(SessionError::Fatal(e)) => {
                error!(error = %e, "uplink handling failed, stopping MQTT subscriber");
                return Err(e);
            }
            Err(SessionError::Broker(e)) => {
                error!(error = %e, "MQTT connection error");

                retry_count += 1;
                if retry_count >= config.max_retry_attempts {
                    error!(
                        max_retries = config.max_retry_attempts,
                        "max retry attempts reached, stopping MQTT subscriber"
                    );
                    return Err(e);
                }

                warn!(
                    attempt = retry_count,
                    max_attempts = config.max_retry_attempts,
                    "retrying MQTT connection"
                );

                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    _ = tokio::time::sleep(config.retry_delay()) => {}
                }
            }
        }
    }

    info!("MQTT subscriber stopped");
    Ok(())
}

async fn run_mqtt_connection(
    config: &MqttSubscriberConfig,
    shutdown_token: &CancellationToken,
    handler: &Arc<dyn UplinkHandler>,
    retry_count: &mut u32,
) -> Result<(), SessionError> {
    let (host, port) = parse_broker_url(&config.broker_url).map_err(SessionError::Fatal)?;

    let mut mqtt_options = MqttOptions::new(&config.client_id, host, port);
    mqtt_options.set_keep_alive(config.keep_alive());
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    client
        .subscribe(&config.topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| {
            SessionError::Broker(DomainError::RepositoryError(anyhow::anyhow!(
                "Failed to subscribe: {}",
                e
            )))
        })?;

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_mqtt_message(&publish.topic, &publish.payload, handler.as_ref())
                            .await
                            .map_err(SessionError::Fatal)?;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to MQTT broker");
                        *retry_count = 0;
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        info!(topic = %config.topic, "subscribed to MQTT topic");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        return Err(SessionError::Broker(DomainError::RepositoryError(
                            anyhow::anyhow!("MQTT event loop error: {}", e),
                        )));
                    }
                }
            }
        }
    }
}

/// Handle one incoming MQTT message
///
/// Each message gets its own root span. Only uplink events reach the
/// handler; other events and unparseable topics are skipped.
pub(crate) async fn handle_mqtt_message(
    topic: &str,
    payload: &[u8],
    handler: &dyn UplinkHandler,
) -> DomainResult<()> {
    let span = info_span!(
        parent: Span::none(),
        "mqtt_message",
        topic = %topic,
        payload_size = payload.len(),
        dev_eui = tracing::field::Empty,
    );

    async {
        let parsed = match parse_topic(topic) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to parse MQTT topic, skipping message");
                return Ok(());
            }
        };

        Span::current().record("dev_eui", parsed.dev_eui.as_str());

        if !parsed.is_uplink() {
            debug!(event = %parsed.event, "ignoring non-uplink event");
            return Ok(());
        }

        match handler.handle_uplink(payload).await {
            Ok(outcome) => {
                info!(outcome = ?outcome, "uplink reconciled");
                Ok(())
            }
            Err(e) if e.is_event_local() => {
                warn!(error = %e, "uplink rejected, skipping message");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
    .instrument(span)
    .await
}

/// Parse broker URL in format mqtt://host:port or tcp://host:port or host:port
fn parse_broker_url(url: &str) -> DomainResult<(&str, u16)> {
    let url = url.trim_start_matches("mqtt://");
    let url = url.trim_start_matches("tcp://");

    let parts: Vec<&str> = url.split(':').collect();
    match parts.as_slice() {
        [host] if !host.is_empty() => Ok((*host, 1883)),
        [host, port] if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|_| {
                DomainError::InvalidConfig(format!("Invalid port in broker URL: {}", port))
            })?;
            Ok((*host, port))
        }
        _ => Err(DomainError::InvalidConfig(format!(
            "Invalid broker URL format: {}",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockUplinkHandler, ReconcileOutcome};

    const UPLINK_TOPIC: &str = "application/app-1/device/7d1f5420e81235c1/event/up";

    #[test]
    fn test_parse_broker_url_with_port() {
        let (host, port) = parse_broker_url("mqtt://localhost:1883").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn test_parse_broker_url_without_scheme() {
        let (host, port) = parse_broker_url("wes-rabbitmq:1883").unwrap();
        assert_eq!(host, "wes-rabbitmq");
        assert_eq!(port, 1883);
    }

    #[test]
    fn test_parse_broker_url_default_port() {
        let (host, port) = parse_broker_url("tcp://chirpstack-mosquitto").unwrap();
        assert_eq!(host, "chirpstack-mosquitto");
        assert_eq!(port, 1883);
    }

    #[test]
    fn test_parse_broker_url_invalid() {
        assert!(parse_broker_url("mqtt://host:port").is_err());
        assert!(parse_broker_url("mqtt://").is_err());
        assert!(parse_broker_url("a:b:c").is_err());
    }

    #[tokio::test]
    async fn test_handle_uplink_message() {
        let mut handler = MockUplinkHandler::new();
        handler
            .expect_handle_uplink()
            .withf(|payload: &[u8]| payload == b"{}")
            .times(1)
            .returning(|_| Ok(ReconcileOutcome::UpdatedKnownDevice));

        handle_mqtt_message(UPLINK_TOPIC, b"{}", &handler)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_uplink_event_is_skipped() {
        let mut handler = MockUplinkHandler::new();
        handler.expect_handle_uplink().times(0);

        handle_mqtt_message(
            "application/app-1/device/7d1f5420e81235c1/event/join",
            b"{}",
            &handler,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_topic_is_skipped() {
        let mut handler = MockUplinkHandler::new();
        handler.expect_handle_uplink().times(0);

        handle_mqtt_message("invalid-topic-format", b"{}", &handler)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_event_local_error_is_skipped() {
        let mut handler = MockUplinkHandler::new();
        handler
            .expect_handle_uplink()
            .returning(|_| Err(DomainError::InvalidDevEui("zz".to_string())));

        handle_mqtt_message(UPLINK_TOPIC, b"{}", &handler)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remote_error_is_fatal() {
        let mut handler = MockUplinkHandler::new();
        handler.expect_handle_uplink().returning(|_| {
            Err(DomainError::NetworkServerAuth("token expired".to_string()))
        });

        let result = handle_mqtt_message(UPLINK_TOPIC, b"{}", &handler).await;
        assert!(matches!(result, Err(DomainError::NetworkServerAuth(_))));
    }

    #[tokio::test]
    async fn test_subscriber_exits_when_already_cancelled() {
        let handler: Arc<dyn UplinkHandler> = Arc::new(MockUplinkHandler::new());
        let token = CancellationToken::new();
        token.cancel();

        run_mqtt_subscriber(MqttSubscriberConfig::default(), handler, token)
            .await
            .unwrap();
    }
}
