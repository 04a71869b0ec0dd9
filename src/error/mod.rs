//! Error types for the widget runtime.

pub mod unified;

pub use unified::FailureKind;

use thiserror::Error;

/// Failure of a single backend call (chat or persistence endpoint).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Backend reported an error: {0}")]
    Backend(String),
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Status { .. } => FailureKind::Status,
            Self::Malformed(_) => FailureKind::Malformed,
            Self::Backend(_) => FailureKind::Backend,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Failure reading or writing durable local storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Primary error type for widget operations.
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Missing required attribute: agent-id")]
    MissingAgentId,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WidgetError>;
