//! Error types for the WBXML codec.

use thiserror::Error;

/// Result type for codec operations.
pub type WbxmlResult<T> = Result<T, WbxmlError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WbxmlError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The document header is not a WBXML header this codec understands.
    #[error("invalid WBXML header: {message}")]
    InvalidHeader {
        /// Description of the header problem.
        message: String,
    },

    /// The document uses a character set other than UTF-8.
    #[error("unsupported character set: {charset:#x}")]
    UnsupportedCharset {
        /// The MIBenum charset value found in the header.
        charset: u32,
    },

    /// A tag name has no token in its codepage table.
    #[error("no token for tag {name:?} in codepage {page}")]
    UnknownTag {
        /// Codepage number.
        page: u8,
        /// Element name that could not be mapped.
        name: String,
    },

    /// A control token this codec does not support was encountered.
    #[error("unsupported control token {token:#04x} at offset {offset}")]
    UnsupportedToken {
        /// The token byte.
        token: u8,
        /// Byte offset in the input.
        offset: usize,
    },

    /// Attribute content is not part of the ActiveSync profile of WBXML.
    #[error("attributes are not supported (tag at offset {offset})")]
    AttributesUnsupported {
        /// Byte offset of the offending tag.
        offset: usize,
    },

    /// Inline string content was not valid UTF-8.
    #[error("invalid UTF-8 string content")]
    InvalidUtf8,

    /// A multi-byte integer overflowed 32 bits.
    #[error("multi-byte integer overflow")]
    IntegerOverflow,

    /// A length field claimed more data than the limit allows.
    #[error("declared length {claimed} exceeds the maximum of {max_allowed}")]
    SizeLimitExceeded {
        /// Length claimed by the input.
        claimed: u64,
        /// Maximum allowed length.
        max_allowed: u64,
    },

    /// Element nesting exceeded the depth limit.
    #[error("element nesting deeper than {max_depth} levels")]
    DepthLimitExceeded {
        /// Maximum allowed depth.
        max_depth: usize,
    },

    /// Structurally invalid document (e.g. END without an open element).
    #[error("invalid WBXML structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl WbxmlError {
    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}
