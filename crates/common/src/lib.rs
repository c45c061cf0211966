pub mod backend;
pub mod chirpstack;
pub mod domain;
pub mod telemetry;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockBackendClient;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockNetworkServerClient;
