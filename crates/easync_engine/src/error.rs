//! Error types for the sync engine.

use easync_protocol::ProvisionStatus;
use easync_wbxml::WbxmlError;
use thiserror::Error;

/// Result type for engine operations.
pub type EasResult<T> = Result<T, EasError>;

/// Errors that can occur while executing protocol operations.
///
/// The taxonomy is closed: connectivity failures are `Transport`,
/// credential and policy-key rejections are `Authorization`, failure
/// status codes inside structurally valid responses are `Protocol`,
/// malformed wire data is `Decode`, and rejected provisioning is
/// `Policy`. Callers decide retry policy from the variant; the engine
/// only retries the single provision-and-retry cycle on authorization
/// expiry.
#[derive(Error, Debug)]
pub enum EasError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The server rejected the request's authorization (HTTP 401/449).
    #[error("authorization rejected with HTTP status {http_status}")]
    Authorization {
        /// The HTTP status that signalled the rejection.
        http_status: u16,
    },

    /// A structurally valid response carried a failure status code.
    #[error("{command} failed with status {code}: {description}")]
    Protocol {
        /// Command that failed.
        command: String,
        /// Numeric status code from the response body.
        code: u8,
        /// Mapped description of the code.
        description: String,
    },

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] WbxmlError),

    /// The server rejected provisioning; the session stays
    /// unprovisioned.
    #[error("provisioning rejected: {status}")]
    Policy {
        /// Provisioning status reported by the server.
        status: ProvisionStatus,
    },

    /// The server demanded a remote wipe during provisioning.
    #[error("server demanded a remote wipe")]
    RemoteWipe,

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// State store failure reported by the collaborator.
    #[error("state store error: {0}")]
    Store(String),
}

impl EasError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a protocol error from a command name and status.
    pub fn protocol(command: impl Into<String>, code: u8, description: impl Into<String>) -> Self {
        Self::Protocol {
            command: command.into(),
            code,
            description: description.into(),
        }
    }

    /// Returns true if the operation may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            EasError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns true for authorization-expiry failures (HTTP 449).
    pub fn is_authorization_expired(&self) -> bool {
        matches!(self, EasError::Authorization { http_status: 449 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(EasError::transport_retryable("connection reset").is_retryable());
        assert!(!EasError::transport_fatal("bad certificate").is_retryable());
        assert!(!EasError::Authorization { http_status: 401 }.is_retryable());
        assert!(!EasError::protocol("Sync", 3, "invalid sync key").is_retryable());
        assert!(!EasError::Cancelled.is_retryable());
    }

    #[test]
    fn authorization_expiry_detection() {
        assert!(EasError::Authorization { http_status: 449 }.is_authorization_expired());
        assert!(!EasError::Authorization { http_status: 401 }.is_authorization_expired());
    }

    #[test]
    fn display_carries_status_detail() {
        let err = EasError::protocol("Sync", 3, "invalid or expired sync key");
        let s = err.to_string();
        assert!(s.contains("Sync"));
        assert!(s.contains('3'));
    }
}
