use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid uplink message: {0}")]
    InvalidMessage(String),

    #[error("Invalid MQTT topic: {0}")]
    InvalidTopic(String),

    #[error("Invalid device EUI: {0}")]
    InvalidDevEui(String),

    #[error("Manifest I/O error at {path}: {source}")]
    ManifestIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest parse error at {path}: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest encode error at {path}: {source}")]
    ManifestEncode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network server error: {0}")]
    NetworkServer(String),

    #[error("Network server authentication failed: {0}")]
    NetworkServerAuth(String),

    #[error("Backend request failed for {endpoint}: {message}")]
    Backend { endpoint: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

impl DomainError {
    /// Errors that only affect the message being handled; the subscriber logs
    /// them and moves on to the next event.
    pub fn is_event_local(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidMessage(_)
                | DomainError::InvalidTopic(_)
                | DomainError::InvalidDevEui(_)
        )
    }
}
