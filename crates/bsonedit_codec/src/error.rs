//! Error types for the codec crate.

use thiserror::Error;

/// Errors that can occur while decoding the binary wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before the declared end of a record.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A declared length does not match the bytes that follow.
    #[error("declared size does not match content: {message}")]
    SizeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// An element type byte has no supported mapping.
    #[error("unsupported BSON element type: 0x{type_byte:02x}")]
    UnsupportedType {
        /// The offending type byte.
        type_byte: u8,
    },

    /// A string field holds invalid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// An element is structurally malformed.
    #[error("malformed element: {message}")]
    Malformed {
        /// Description of the structural problem.
        message: String,
    },

    /// Documents nest deeper than the decoder allows.
    #[error("document nesting exceeds {max_depth} levels")]
    DepthLimitExceeded {
        /// The configured nesting limit.
        max_depth: usize,
    },
}

impl DecodeError {
    /// Create a size mismatch error.
    pub fn size_mismatch(message: impl Into<String>) -> Self {
        Self::SizeMismatch {
            message: message.into(),
        }
    }

    /// Create a malformed element error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Errors that can occur while encoding a value to the wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Only documents exist at the top level of the wire form; scalars
    /// and arrays have no standalone record encoding.
    #[error("top-level value must be a document")]
    TopLevelNotDocument,

    /// Keys and regex components are NUL-terminated on the wire and
    /// cannot themselves contain NUL bytes.
    #[error("string {text:?} cannot be NUL-terminated on the wire")]
    NulInCstring {
        /// The offending string.
        text: String,
    },

    /// The encoded record would overflow the format's signed 32-bit
    /// size field.
    #[error("record exceeds the maximum encodable size")]
    RecordTooLarge,
}

/// Errors that can occur while parsing the JSON text form.
///
/// Covers syntax errors, duplicate object keys, malformed `$`-prefixed
/// wrapper objects and numbers outside the representable range. The
/// message carries the line and column of the failure.
#[derive(Debug, Error)]
pub enum TextError {
    /// The text is not a well-formed JSON value.
    #[error("malformed JSON text: {0}")]
    Malformed(#[from] serde_json::Error),
}
