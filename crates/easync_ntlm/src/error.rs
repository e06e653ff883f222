//! Error types for NTLM message handling.

use thiserror::Error;

/// Result type for NTLM operations.
pub type NtlmResult<T> = Result<T, NtlmError>;

/// Errors that can occur while parsing handshake messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NtlmError {
    /// The message is shorter than its layout requires.
    #[error("message truncated: needed {needed} bytes, got {got}")]
    Truncated {
        /// Bytes the layout requires.
        needed: usize,
        /// Bytes actually present.
        got: usize,
    },

    /// The NTLMSSP signature is missing.
    #[error("missing NTLMSSP signature")]
    BadSignature,

    /// The message type field does not match the expected handshake phase.
    #[error("wrong message type: expected {expected}, found {found}")]
    WrongMessageType {
        /// Expected message type.
        expected: u32,
        /// Message type found in the data.
        found: u32,
    },
}
