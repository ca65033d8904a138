//! Protocol constants.
//!
//! These values are part of the wire contract with the deployed registries and
//! MUST NOT be changed without a matching contract upgrade.

use alloy_primitives::{b256, B256};

// Multihash / CIDv0

/// Multihash function code for sha2-256.
pub const MULTIHASH_SHA2_256: u8 = 0x12;

/// Digest length byte for a 32-byte sha2-256 digest.
pub const MULTIHASH_DIGEST_LEN: u8 = 0x20;

/// Length of a decoded CIDv0 multihash (2-byte header + 32-byte digest).
pub const CIDV0_DECODED_LEN: usize = 34;

/// Length of the on-chain hash reference.
pub const ONCHAIN_HASH_LEN: usize = 32;

/// URI scheme prefix for IPFS content.
pub const IPFS_URI_PREFIX: &str = "ipfs://";

// EIP-712 feedback authorization

/// EIP-712 domain name used by the Reputation Registry.
pub const FEEDBACK_AUTH_DOMAIN_NAME: &str = "ERC8004ReputationRegistry";

/// EIP-712 domain version used by the Reputation Registry.
pub const FEEDBACK_AUTH_DOMAIN_VERSION: &str = "1";

/// Primary type name of the signed feedback authorization.
pub const FEEDBACK_AUTH_PRIMARY_TYPE: &str = "FeedbackAuth";

/// Canonical EIP-712 type string of the feedback authorization.
pub const FEEDBACK_AUTH_TYPE: &str = "FeedbackAuth(uint256 agentId,address clientAddress,uint64 indexLimit,uint256 expiry,uint256 chainId,address signerAddress)";

/// keccak256 of [`FEEDBACK_AUTH_TYPE`].
pub const FEEDBACK_AUTH_TYPEHASH: B256 =
    b256!("eadbb3785e12623e24fa45b9f832af45d2f1cc2973342340dd85f77ab5afb90b");

/// Length of the ABI-encoded authorization tuple (six static words).
pub const FEEDBACK_AUTH_ENCODED_LEN: usize = 6 * 32;

/// Length of an `r || s || v` secp256k1 signature.
pub const SIGNATURE_LEN: usize = 65;

// Scores

/// Maximum feedback score / validation response.
pub const MAX_SCORE: u8 = 100;

/// Registration file `type` value for registration-v1 documents.
pub const REGISTRATION_FILE_TYPE_V1: &str =
    "https://eips.ethereum.org/EIPS/eip-8004#registration-v1";

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn test_feedback_auth_typehash() {
        assert_eq!(keccak256(FEEDBACK_AUTH_TYPE.as_bytes()), FEEDBACK_AUTH_TYPEHASH);
    }

    #[test]
    fn test_multihash_header() {
        assert_eq!(MULTIHASH_SHA2_256, 0x12);
        assert_eq!(MULTIHASH_DIGEST_LEN as usize, ONCHAIN_HASH_LEN);
        assert_eq!(CIDV0_DECODED_LEN, 2 + ONCHAIN_HASH_LEN);
    }
}
