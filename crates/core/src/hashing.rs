//! Hashing utilities.
//!
//! Tags and document hashes travel on-chain as `bytes32`. An absent value is encoded
//! as the zero word, which the registries treat as "no filter" / "not provided".

use alloy_primitives::{keccak256 as alloy_keccak256, B256};

/// keccak256 of `data`, delegating to Alloy's implementation.
///
/// # Example
///
/// ```
/// use erc8004_core::hashing::keccak256;
///
/// let hash = keccak256(b"hello");
/// ```
pub fn keccak256(data: &[u8]) -> B256 {
    alloy_keccak256(data)
}

/// Hash a free-text tag into its `bytes32` form.
///
/// `None` and the empty string both map to the zero word.
pub fn tag_hash(tag: Option<&str>) -> B256 {
    match tag {
        Some(tag) if !tag.is_empty() => keccak256(tag.as_bytes()),
        _ => B256::ZERO,
    }
}

/// Hash of an off-chain document as committed on-chain (`keccak256(content)`).
pub fn content_hash(content: &[u8]) -> B256 {
    keccak256(content)
}
