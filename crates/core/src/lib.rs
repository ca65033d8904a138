//! # ERC-8004 Core
//!
//! Pure building blocks for clients of the ERC-8004 Identity, Reputation and
//! Validation registries.
//!
//! Everything in this crate is synchronous, deterministic and free of I/O. The two
//! pieces that must match the deployed contracts bit for bit live here:
//!
//! - **CID codec** ([`cid`]): CIDv0 strings to and from the `bytes32` stored on-chain
//! - **Feedback authorization** ([`authorization`]): the EIP-712 `FeedbackAuth`
//!   payload the Reputation Registry verifies, and its `feedbackAuth` wire form
//!
//! ## Features
//!
//! - **Ethereum Types**: Uses Alloy primitives for Address, B256, U256 and signatures
//! - **Domain Types**: registration and feedback documents, on-chain read models
//! - **Constants**: multihash header, EIP-712 domain and type strings
//! - **Hashing**: keccak256 helpers for tags and document hashes

#![warn(missing_docs)]

pub mod authorization;
pub mod cid;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod types;

// Re-export commonly used items
pub use authorization::{
    build_authorization, AuthorizationDomain, FeedbackAuthorization, SignedFeedbackAuthorization,
};
pub use cid::{decode_cid, encode_hash, ipfs_uri, Multihash};
pub use error::{CoreError, Result};
pub use hashing::{content_hash, keccak256, tag_hash};
pub use types::*;

// Re-export Alloy primitives for convenience
pub use alloy_dyn_abi::TypedData;
pub use alloy_primitives::{Address, Bytes, PrimitiveSignature, B256, U256};
