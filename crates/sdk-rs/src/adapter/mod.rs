//! Chain-interaction backends.
//!
//! Protocol clients only ever hold an `Arc<dyn BlockchainAdapter>`. Reads and writes
//! carry ABI calldata built from the `sol!` bindings in [`crate::contracts`], which keeps
//! the trait object-safe and the backends ignorant of any particular registry.

mod rpc;

pub use rpc::{AdapterOptions, AlloyAdapter};

use async_trait::async_trait;
use erc8004_core::{Address, Bytes, PrimitiveSignature, TypedData, B256};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a chain backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The node could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The node or the contract rejected the call.
    #[error("Transaction rejected{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    RejectedTransaction {
        /// Revert reason, when the node returned one.
        reason: Option<String>,
    },

    /// No signer is available, or the signer refused.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The backend gave up waiting.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered with something none of the above describes.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl AdapterError {
    /// Rejection with a known revert reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        AdapterError::RejectedTransaction {
            reason: Some(reason.into()),
        }
    }

    /// Whether retrying the same call unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Connection(_) | AdapterError::Timeout(_))
    }
}

/// A log emitted by a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, signature hash first.
    pub topics: Vec<B256>,
    /// Non-indexed data.
    pub data: Bytes,
}

/// Result of a state-changing call that made it into a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Receipt status.
    pub success: bool,
    /// Emitted logs.
    pub logs: Vec<EventLog>,
}

/// Capability set every chain backend provides.
#[async_trait]
pub trait BlockchainAdapter: Send + Sync {
    /// Execute a read-only call against `contract`. Needs no signer.
    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes, AdapterError>;

    /// Submit a state-changing call and wait until it is included or fails.
    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
    ) -> Result<TransactionOutcome, AdapterError>;

    /// Sign an EIP-712 typed-data document with the backend's signer.
    async fn sign_typed_data(&self, payload: &TypedData)
        -> Result<PrimitiveSignature, AdapterError>;

    /// Signer address, or `None` for a read-only backend.
    fn address(&self) -> Option<Address>;

    /// Chain the backend is connected to.
    async fn chain_id(&self) -> Result<u64, AdapterError>;
}
