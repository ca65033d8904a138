//! Error type of the SDK.

use erc8004_core::{Address, CoreError, U256};
use thiserror::Error;

use crate::adapter::AdapterError;
use crate::storage::StorageError;

/// SDK error type.
///
/// Lower-layer errors are wrapped as-is so callers can still match on their kind.
#[derive(Error, Debug)]
pub enum SdkError {
    /// Caller input rejected by the codec or the authorization builder.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Chain backend failure.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Content store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The submitting address is the `signer_address` of the authorization it submits.
    #[error("Self-feedback not allowed: {address} signed the authorization for agent {agent_id}")]
    SelfFeedback {
        /// Agent the feedback is about.
        agent_id: U256,
        /// Address that tried to submit.
        address: Address,
    },

    /// A write was requested through an adapter without a signer.
    #[error("Operation requires a signer but the adapter is read-only")]
    NoSigner,

    /// A contract return value or document could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A confirmed transaction did not emit the expected event.
    #[error("Transaction {tx_hash} did not emit {event}")]
    MissingEvent {
        /// Event that was expected.
        event: &'static str,
        /// Transaction that was inspected.
        tx_hash: erc8004_core::B256,
    },
}

impl SdkError {
    /// Whether retrying the same operation unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::Adapter(e) => e.is_retryable(),
            SdkError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn decode(context: &str, err: impl std::fmt::Display) -> Self {
        SdkError::Decode(format!("{context}: {err}"))
    }
}

/// Result type alias for SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;
