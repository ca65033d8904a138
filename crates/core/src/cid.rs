//! CIDv0 <-> on-chain hash codec.
//!
//! The registries store off-chain document references as a bare `bytes32`. A CIDv0 is
//! the base58 encoding of a sha2-256 multihash (`0x12 0x20 || digest`), so the on-chain
//! value is the digest with the two constant header bytes stripped. The reverse
//! direction re-prepends the same header.
//!
//! Only CIDv0 is accepted. Anything else fails loudly: a best-effort conversion would be
//! written immutably on-chain.

use alloy_primitives::B256;

use crate::constants::{
    CIDV0_DECODED_LEN, IPFS_URI_PREFIX, MULTIHASH_DIGEST_LEN, MULTIHASH_SHA2_256,
    ONCHAIN_HASH_LEN,
};
use crate::error::{CoreError, Result};

/// Decoded CIDv0 multihash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multihash {
    /// Hash function code (always 0x12).
    pub function: u8,
    /// Digest length (always 0x20).
    pub length: u8,
    /// sha2-256 digest.
    pub digest: B256,
}

impl Multihash {
    /// Parse a CIDv0 string (optionally `ipfs://`-prefixed) into its multihash parts.
    pub fn parse(cid: &str) -> Result<Self> {
        let cid = strip_ipfs_prefix(cid);
        let bytes = bs58::decode(cid)
            .into_vec()
            .map_err(|e| CoreError::InvalidFormat(format!("{cid:?} is not valid base58: {e}")))?;

        if bytes.len() != CIDV0_DECODED_LEN {
            return Err(CoreError::InvalidFormat(format!(
                "{cid:?} decodes to {} bytes, expected {CIDV0_DECODED_LEN}",
                bytes.len()
            )));
        }

        let (function, length) = (bytes[0], bytes[1]);
        if function != MULTIHASH_SHA2_256 || length != MULTIHASH_DIGEST_LEN {
            return Err(CoreError::UnsupportedMultihash { function, length });
        }

        Ok(Self {
            function,
            length,
            digest: B256::from_slice(&bytes[2..]),
        })
    }

    /// Wrap a sha2-256 digest.
    pub const fn sha2_256(digest: B256) -> Self {
        Self {
            function: MULTIHASH_SHA2_256,
            length: MULTIHASH_DIGEST_LEN,
            digest,
        }
    }

    /// The 34 multihash bytes.
    pub fn to_bytes(&self) -> [u8; CIDV0_DECODED_LEN] {
        let mut out = [0u8; CIDV0_DECODED_LEN];
        out[0] = self.function;
        out[1] = self.length;
        out[2..].copy_from_slice(self.digest.as_slice());
        out
    }

    /// Base58 CIDv0 string.
    pub fn to_cid(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

/// Remove a leading `ipfs://` scheme, if any.
pub fn strip_ipfs_prefix(cid_or_uri: &str) -> &str {
    cid_or_uri
        .strip_prefix(IPFS_URI_PREFIX)
        .unwrap_or(cid_or_uri)
}

/// Build an `ipfs://` URI for a CID (idempotent for inputs that already carry it).
pub fn ipfs_uri(cid: &str) -> String {
    format!("{IPFS_URI_PREFIX}{}", strip_ipfs_prefix(cid))
}

/// Convert a CIDv0 (bare or `ipfs://`-prefixed) into the 32-byte on-chain hash.
///
/// # Errors
///
/// - [`CoreError::InvalidFormat`] if the string is not base58 or does not decode to 34 bytes
/// - [`CoreError::UnsupportedMultihash`] if the header is not `0x12 0x20`
///
/// # Example
///
/// ```
/// use erc8004_core::cid::{decode_cid, encode_hash};
///
/// let hash = decode_cid("ipfs://QmR7GSQM93Cx5eAg6a6yRzNde1FQv7uL6X1o4k7zrJa3LX").unwrap();
/// assert_eq!(
///     encode_hash(hash.as_slice()).unwrap(),
///     "QmR7GSQM93Cx5eAg6a6yRzNde1FQv7uL6X1o4k7zrJa3LX"
/// );
/// ```
pub fn decode_cid(cid: &str) -> Result<B256> {
    Multihash::parse(cid).map(|mh| mh.digest)
}

/// Convert a 32-byte on-chain hash back into a bare CIDv0 string.
///
/// # Errors
///
/// [`CoreError::InvalidLength`] unless `hash` is exactly 32 bytes.
pub fn encode_hash(hash: &[u8]) -> Result<String> {
    if hash.len() != ONCHAIN_HASH_LEN {
        return Err(CoreError::InvalidLength {
            expected: ONCHAIN_HASH_LEN,
            actual: hash.len(),
        });
    }
    Ok(encode_digest(B256::from_slice(hash)))
}

/// Infallible form of [`encode_hash`] for values already typed as `B256`.
pub fn encode_digest(hash: B256) -> String {
    Multihash::sha2_256(hash).to_cid()
}
