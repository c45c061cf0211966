use super::ReconcileOutcome;
use async_trait::async_trait;
use common::domain::DomainResult;

/// Consumer of raw uplink payloads delivered by the transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UplinkHandler: Send + Sync {
    /// Fully process one uplink. An `Err` is fatal for the subscriber.
    async fn handle_uplink(&self, payload: &[u8]) -> DomainResult<ReconcileOutcome>;
}
