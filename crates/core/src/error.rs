//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
///
/// Every variant is a caller input error: none of them is retryable without
/// changing the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Identifier is not valid base58 or does not decode to a 34-byte multihash.
    #[error("Invalid content identifier: {0}")]
    InvalidFormat(String),

    /// Multihash header is not sha2-256 with a 32-byte digest.
    #[error(
        "Unsupported multihash: function 0x{function:02x}, length 0x{length:02x} (only CIDv0 sha2-256 is supported)"
    )]
    UnsupportedMultihash {
        /// Hash function code found in the first byte.
        function: u8,
        /// Digest length found in the second byte.
        length: u8,
    },

    /// On-chain hash has the wrong number of bytes.
    #[error("Invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Authorization or call parameter rejected before any signing or network call.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Feedback score or validation response outside 0..=100.
    #[error("Invalid score: {0} (must be between 0 and 100)")]
    InvalidScore(u8),

    /// Signature bytes are malformed or do not recover to the expected signer.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

impl CoreError {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        CoreError::InvalidParameter(msg.into())
    }
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
