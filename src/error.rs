//! Error types for the dashboard client

use serde::Serialize;
use thiserror::Error;

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Coarse failure classification surfaced to views.
///
/// Views only need to know whether the backend was unreachable, answered
/// with a declared failure, or answered with something unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Request never reached the backend or never returned
    Network,
    /// Backend answered but declared failure
    ServerRejected,
    /// Payload was malformed or had an unexpected shape
    Decode,
}

/// Dashboard client errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response payload carried `success: false`
    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Missing or invalid session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Form validation failed before dispatch
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// Map onto the view-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Network(_) | DashboardError::Config(_) => ErrorKind::Network,
            DashboardError::ServerRejected(_)
            | DashboardError::Http { .. }
            | DashboardError::Unauthorized(_)
            | DashboardError::Validation(_) => ErrorKind::ServerRejected,
            DashboardError::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Decode(err.to_string())
        } else {
            DashboardError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Decode(err.to_string())
    }
}

impl From<toml::de::Error> for DashboardError {
    fn from(err: toml::de::Error) -> Self {
        DashboardError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(DashboardError::Network("down".into()).kind(), ErrorKind::Network);
        assert_eq!(
            DashboardError::Http { status: 500, message: String::new() }.kind(),
            ErrorKind::ServerRejected
        );
        assert_eq!(DashboardError::Decode("bad".into()).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_validation_message_joins_errors() {
        let err = DashboardError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: DashboardError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
