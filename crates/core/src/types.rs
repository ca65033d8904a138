//! Domain types shared by the registries' clients.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_SCORE, REGISTRATION_FILE_TYPE_V1};
use crate::error::CoreError;

/// Feedback score or validation response, 0 to 100.
///
/// This type enforces validation during both construction and deserialization
/// to prevent invalid values from reaching a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    /// Create a new Score, validating the range.
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if value > MAX_SCORE {
            return Err(CoreError::InvalidScore(value));
        }
        Ok(Score(value))
    }

    /// Get the raw value.
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Score {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl Serialize for Score {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Score::new(value).map_err(serde::de::Error::custom)
    }
}

/// Deployed registry addresses for one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    /// Identity Registry (ERC-721 agent identities).
    pub identity_registry: Address,
    /// Reputation Registry (feedback).
    pub reputation_registry: Address,
    /// Validation Registry (validation requests/responses).
    pub validation_registry: Address,
    /// Chain the registries live on.
    pub chain_id: u64,
}

/// On-chain metadata entry attached to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata key.
    pub key: String,
    /// Metadata value (stored as UTF-8 bytes on-chain).
    pub value: String,
}

impl MetadataEntry {
    /// Create a metadata entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Service endpoint advertised in a registration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint name, e.g. `A2A` or `MCP`.
    pub name: String,
    /// Endpoint URL or identifier.
    pub endpoint: String,
    /// Protocol version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Protocol-specific capability description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<serde_json::Value>,
}

/// Back-reference from a registration file to an on-chain identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRef {
    /// Agent id in the registry.
    pub agent_id: u64,
    /// Registry identifier, e.g. `eip155:11155111:0x...`.
    pub agent_registry: String,
}

/// Off-chain agent registration file referenced by the identity token URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRegistrationFile {
    /// Document type, [`REGISTRATION_FILE_TYPE_V1`].
    #[serde(rename = "type")]
    pub ty: String,
    /// Agent name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Image URI.
    pub image: String,
    /// Advertised endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// On-chain registrations of this agent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registrations: Vec<RegistrationRef>,
    /// Supported trust models: `reputation`, `crypto-economic`, `tee-attestation`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_trust: Vec<String>,
}

impl AgentRegistrationFile {
    /// Create a registration-v1 document with the mandatory fields.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            ty: REGISTRATION_FILE_TYPE_V1.to_string(),
            name: name.into(),
            description: description.into(),
            image: image.into(),
            endpoints: Vec::new(),
            registrations: Vec::new(),
            supported_trust: Vec::new(),
        }
    }
}

/// x402 proof of payment attached to a feedback file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOfPayment {
    /// Payer.
    pub from_address: String,
    /// Payee.
    pub to_address: String,
    /// Chain of the payment.
    pub chain_id: String,
    /// Payment transaction hash.
    pub tx_hash: String,
}

/// Off-chain feedback document whose hash is committed with `giveFeedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFile {
    /// Registry identifier, e.g. `eip155:11155111:0x...`.
    pub agent_registry: String,
    /// Agent the feedback is about.
    pub agent_id: u64,
    /// Feedback author.
    pub client_address: String,
    /// ISO 8601 creation time.
    pub created_at: String,
    /// Hex-encoded signed feedback authorization.
    pub feedback_auth: String,
    /// Score 0..=100.
    pub score: Score,
    /// Primary tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag1: Option<String>,
    /// Secondary tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag2: Option<String>,
    /// Skill being rated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    /// Free-form context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Task reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// MCP capability: `prompts`, `resources`, `tools` or `completions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// Name of the capability item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Payment evidence.
    #[serde(
        rename = "proof_of_payment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub proof_of_payment: Option<ProofOfPayment>,
}

/// A single feedback entry as stored by the Reputation Registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Score 0..=100.
    pub score: u8,
    /// Hashed primary tag (zero if absent).
    pub tag1: B256,
    /// Hashed secondary tag (zero if absent).
    pub tag2: B256,
    /// Whether the client revoked it.
    pub is_revoked: bool,
}

/// Column-oriented result of `readAllFeedback`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackList {
    /// Feedback authors.
    pub client_addresses: Vec<Address>,
    /// Scores.
    pub scores: Vec<u8>,
    /// Hashed primary tags.
    pub tag1s: Vec<B256>,
    /// Hashed secondary tags.
    pub tag2s: Vec<B256>,
    /// Revocation flags.
    pub revoked_statuses: Vec<bool>,
}

impl FeedbackList {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Aggregate of feedback matching a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReputationSummary {
    /// Number of matching entries.
    pub count: u64,
    /// Average score of matching entries.
    pub average_score: u8,
}

/// Latest response to a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationStatus {
    /// Validator the request was addressed to.
    pub validator_address: Address,
    /// Validated agent.
    pub agent_id: U256,
    /// Response 0..=100.
    pub response: u8,
    /// Hash of the response document (zero if absent).
    pub response_hash: B256,
    /// Hashed tag (zero if absent).
    pub tag: B256,
    /// Timestamp of the last response.
    pub last_update: U256,
}

/// Aggregate of validation responses matching a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Number of matching responses.
    pub count: u64,
    /// Average response.
    pub average_response: u8,
}
