//! Rust SDK for the ERC-8004 registries.
//!
//! This crate provides:
//! - Clients for the Identity, Reputation and Validation registries
//! - Signing of feedback authorizations through any [`BlockchainAdapter`]
//! - Content-addressed storage of registration and feedback files
//! - TOML configuration and logging setup
//!
//! Encoding that must match the contracts exactly (CIDs, EIP-712 payloads) lives in
//! [`erc8004_core`], re-exported here.

#![warn(missing_docs)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod identity;
pub mod reputation;
pub mod signing;
pub mod storage;
pub mod validation;

pub use erc8004_core;

pub use adapter::{
    AdapterError, AdapterOptions, AlloyAdapter, BlockchainAdapter, TransactionOutcome,
};
pub use client::Erc8004Client;
pub use config::{init_logging, SdkConfig};
pub use error::{Result, SdkError};
pub use identity::{IdentityClient, Registration};
pub use reputation::{FeedbackOptions, ReputationClient};
pub use signing::sign_authorization;
pub use storage::{ContentStore, IpfsHttpStore, MemoryStore, StorageError, UploadResult};
pub use validation::ValidationClient;

use erc8004_core::CoreError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds. Errors if the system clock reads before the epoch.
pub(crate) fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| {
            SdkError::Core(CoreError::InvalidParameter(
                "system clock is set before the unix epoch".to_string(),
            ))
        })
}
