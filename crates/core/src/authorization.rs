//! Feedback authorization: construction, canonical EIP-712 encoding and wire form.
//!
//! An agent owner delegates the right to leave feedback to one client by signing a
//! `FeedbackAuth` typed-data structure. The Reputation Registry rebuilds the same
//! structure from the `feedbackAuth` bytes passed to `giveFeedback` and checks the
//! signature, so the domain, field order and field types below are wire contract.
//!
//! ```text
//! digest = keccak256(0x19 0x01 || domainSeparator || hashStruct(FeedbackAuth))
//! wire   = abi.encode(agentId, clientAddress, indexLimit, expiry, chainId, signerAddress)
//!          || r || s || v
//! ```

use alloy_dyn_abi::TypedData;
use alloy_primitives::{keccak256, Address, PrimitiveSignature, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct, SolValue};
use serde::{Deserialize, Serialize};

use crate::constants::{
    FEEDBACK_AUTH_DOMAIN_NAME, FEEDBACK_AUTH_DOMAIN_VERSION, FEEDBACK_AUTH_ENCODED_LEN,
    SIGNATURE_LEN,
};
use crate::error::{CoreError, Result};

sol! {
    /// Typed-data struct verified by the Reputation Registry.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    struct FeedbackAuth {
        uint256 agentId;
        address clientAddress;
        uint64 indexLimit;
        uint256 expiry;
        uint256 chainId;
        address signerAddress;
    }
}

/// Named, versioned EIP-712 domain of the feedback authorization.
///
/// The chain id is not part of this struct: it always comes from the authorization
/// being encoded, so the domain and the message cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDomain {
    /// Protocol name.
    pub name: String,
    /// Protocol version.
    pub version: String,
    /// Contract that verifies the signature (the Reputation Registry).
    pub verifying_contract: Address,
}

impl AuthorizationDomain {
    /// Domain of the deployed Reputation Registry at `verifying_contract`.
    pub fn new(verifying_contract: Address) -> Self {
        Self {
            name: FEEDBACK_AUTH_DOMAIN_NAME.to_string(),
            version: FEEDBACK_AUTH_DOMAIN_VERSION.to_string(),
            verifying_contract,
        }
    }
}

/// Unsigned feedback authorization.
///
/// Immutable once built: changing any field means building (and signing) a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAuthorization {
    /// Agent the feedback is about.
    pub agent_id: U256,
    /// Client allowed to submit feedback.
    pub client_address: Address,
    /// Highest feedback index this authorization covers.
    pub index_limit: u64,
    /// Unix timestamp after which the authorization is void.
    pub expiry: u64,
    /// Chain the feedback will be submitted on.
    pub chain_id: u64,
    /// Agent owner or operator signing the authorization.
    pub signer_address: Address,
}

/// Build a feedback authorization, validating it against the caller's clock.
///
/// `now` is the caller's current Unix time; the function never reads the wall clock.
///
/// # Errors
///
/// [`CoreError::InvalidParameter`] if `expiry <= now`, `chain_id == 0`, or either
/// address is the zero address.
pub fn build_authorization(
    agent_id: U256,
    client_address: Address,
    index_limit: u64,
    expiry: u64,
    chain_id: u64,
    signer_address: Address,
    now: u64,
) -> Result<FeedbackAuthorization> {
    if expiry <= now {
        return Err(CoreError::invalid_parameter(format!(
            "expiry {expiry} is not after current time {now}"
        )));
    }
    if chain_id == 0 {
        return Err(CoreError::invalid_parameter("chain id must be non-zero"));
    }
    if client_address.is_zero() {
        return Err(CoreError::invalid_parameter(
            "client address must not be the zero address",
        ));
    }
    if signer_address.is_zero() {
        return Err(CoreError::invalid_parameter(
            "signer address must not be the zero address",
        ));
    }

    Ok(FeedbackAuthorization {
        agent_id,
        client_address,
        index_limit,
        expiry,
        chain_id,
        signer_address,
    })
}

impl FeedbackAuthorization {
    fn as_sol(&self) -> FeedbackAuth {
        FeedbackAuth {
            agentId: self.agent_id,
            clientAddress: self.client_address,
            indexLimit: self.index_limit,
            expiry: U256::from(self.expiry),
            chainId: U256::from(self.chain_id),
            signerAddress: self.signer_address,
        }
    }

    /// EIP-712 domain for this authorization under `domain`.
    pub fn eip712_domain(&self, domain: &AuthorizationDomain) -> Eip712Domain {
        Eip712Domain::new(
            Some(domain.name.clone().into()),
            Some(domain.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(domain.verifying_contract),
            None,
        )
    }

    /// `hashStruct(FeedbackAuth)`.
    pub fn struct_hash(&self) -> B256 {
        self.as_sol().eip712_hash_struct()
    }

    /// The 66-byte EIP-712 preimage `0x19 0x01 || domainSeparator || hashStruct`.
    pub fn canonical_encoding(&self, domain: &AuthorizationDomain) -> Vec<u8> {
        let separator = self.eip712_domain(domain).separator();
        let mut out = Vec::with_capacity(2 + 32 + 32);
        out.extend_from_slice(&[0x19, 0x01]);
        out.extend_from_slice(separator.as_slice());
        out.extend_from_slice(self.struct_hash().as_slice());
        out
    }

    /// Digest that is actually signed: keccak256 of [`Self::canonical_encoding`].
    pub fn signing_hash(&self, domain: &AuthorizationDomain) -> B256 {
        keccak256(self.canonical_encoding(domain))
    }

    /// JSON-shaped typed-data document handed to a typed-data signer.
    pub fn typed_data(&self, domain: &AuthorizationDomain) -> TypedData {
        TypedData::from_struct(&self.as_sol(), Some(self.eip712_domain(domain)))
    }

    /// Attach a signature produced over [`Self::signing_hash`].
    pub fn into_signed(self, signature: PrimitiveSignature) -> SignedFeedbackAuthorization {
        SignedFeedbackAuthorization {
            authorization: self,
            signature,
        }
    }
}

/// A feedback authorization together with its signer's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedFeedbackAuthorization {
    /// The signed fields.
    pub authorization: FeedbackAuthorization,
    /// secp256k1 signature over the authorization's signing hash.
    pub signature: PrimitiveSignature,
}

impl SignedFeedbackAuthorization {
    /// `feedbackAuth` argument of `giveFeedback`: the ABI-encoded tuple followed by
    /// the 65-byte `r || s || v` signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.authorization.as_sol().abi_encode();
        debug_assert_eq!(out.len(), FEEDBACK_AUTH_ENCODED_LEN);
        out.extend_from_slice(&self.signature.as_bytes());
        out
    }

    /// Parse the wire form produced by [`Self::to_bytes`].
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidLength`] if the input is not 257 bytes
    /// - [`CoreError::InvalidParameter`] if a field does not fit its native width
    /// - [`CoreError::InvalidSignature`] if the trailing 65 bytes are not a signature
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let expected = FEEDBACK_AUTH_ENCODED_LEN + SIGNATURE_LEN;
        if bytes.len() != expected {
            return Err(CoreError::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        let (encoded, sig) = bytes.split_at(FEEDBACK_AUTH_ENCODED_LEN);
        let decoded = FeedbackAuth::abi_decode(encoded, true)
            .map_err(|e| CoreError::invalid_parameter(format!("malformed feedbackAuth: {e}")))?;

        let expiry = u64::try_from(decoded.expiry)
            .map_err(|_| CoreError::invalid_parameter("expiry does not fit in u64"))?;
        let chain_id = u64::try_from(decoded.chainId)
            .map_err(|_| CoreError::invalid_parameter("chain id does not fit in u64"))?;
        let signature = PrimitiveSignature::try_from(sig)
            .map_err(|e| CoreError::InvalidSignature(e.to_string()))?;

        Ok(Self {
            authorization: FeedbackAuthorization {
                agent_id: decoded.agentId,
                client_address: decoded.clientAddress,
                index_limit: decoded.indexLimit,
                expiry,
                chain_id,
                signer_address: decoded.signerAddress,
            },
            signature,
        })
    }

    /// Address that produced the signature under `domain`.
    pub fn recover_signer(&self, domain: &AuthorizationDomain) -> Result<Address> {
        let digest = self.authorization.signing_hash(domain);
        self.signature
            .recover_address_from_prehash(&digest)
            .map_err(|e| CoreError::InvalidSignature(e.to_string()))
    }

    /// Check that the signature was made by the authorization's `signer_address`.
    pub fn verify(&self, domain: &AuthorizationDomain) -> Result<()> {
        let recovered = self.recover_signer(domain)?;
        if recovered != self.authorization.signer_address {
            return Err(CoreError::InvalidSignature(format!(
                "recovered {recovered}, expected {}",
                self.authorization.signer_address
            )));
        }
        Ok(())
    }
}
