//! Error types shared between the host seams and the integration.

/// Result type for calls into the host platform.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors reported by host facilities.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The facility exists in the API but this host version does not support it.
    #[error("Unsupported by host: {0}")]
    Unsupported(String),

    /// The downstream platform rejected or failed the request.
    #[error("Platform error: {0}")]
    Platform(String),

    /// The entry was never loaded by the host.
    #[error("Entry not loaded: {0}")]
    NotLoaded(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("Host error: {0}")]
    Other(#[from] anyhow::Error),
}

impl HostError {
    /// Whether this error means the host lacks the requested capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Errors raised by the process-wide host data store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A value already lives under the key but has an unexpected type.
    #[error("State under key '{key}' is not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The integration section could not be deserialized.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// An asset strategy name that is not recognised.
    #[error("Unknown asset strategy: {0}")]
    UnknownStrategy(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
