//! Reputation Registry client.
//!
//! Feedback requires an authorization signed by the agent's owner or operator (see
//! [`erc8004_core::authorization`]). The client checks the preconditions the registry
//! would revert on before anything reaches the adapter.

use alloy::primitives::{Address, Bytes, B256, U256};
use erc8004_core::{
    build_authorization, tag_hash, AuthorizationDomain, CoreError, FeedbackAuthorization,
    FeedbackList, FeedbackRecord, ReputationSummary, Score, SignedFeedbackAuthorization,
};
use std::sync::Arc;
use tracing::info;

use crate::adapter::BlockchainAdapter;
use crate::contracts::{self, ReputationRegistry};
use crate::error::{Result, SdkError};
use crate::signing::sign_authorization;
use crate::unix_now;

/// Optional fields of a feedback submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackOptions {
    /// Primary tag, hashed before submission.
    pub tag1: Option<String>,
    /// Secondary tag, hashed before submission.
    pub tag2: Option<String>,
    /// URI of the off-chain feedback file.
    pub feedback_uri: Option<String>,
    /// Hash of the off-chain feedback file.
    pub feedback_hash: Option<B256>,
}

impl FeedbackOptions {
    /// Set the primary tag.
    pub fn tag1(mut self, tag: impl Into<String>) -> Self {
        self.tag1 = Some(tag.into());
        self
    }

    /// Set the secondary tag.
    pub fn tag2(mut self, tag: impl Into<String>) -> Self {
        self.tag2 = Some(tag.into());
        self
    }

    /// Reference an off-chain feedback file.
    pub fn document(mut self, uri: impl Into<String>, hash: B256) -> Self {
        self.feedback_uri = Some(uri.into());
        self.feedback_hash = Some(hash);
        self
    }
}

/// Client for the Reputation Registry.
#[derive(Clone)]
pub struct ReputationClient {
    adapter: Arc<dyn BlockchainAdapter>,
    address: Address,
}

impl ReputationClient {
    /// Client for the registry at `address`.
    pub fn new(adapter: Arc<dyn BlockchainAdapter>, address: Address) -> Self {
        Self { adapter, address }
    }

    /// Registry address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-712 domain under which this registry verifies authorizations.
    pub fn domain(&self) -> AuthorizationDomain {
        AuthorizationDomain::new(self.address)
    }

    /// Build an authorization for `client_address`, validated against the current time.
    pub fn create_feedback_auth(
        &self,
        agent_id: U256,
        client_address: Address,
        index_limit: u64,
        expiry: u64,
        chain_id: u64,
        signer_address: Address,
    ) -> Result<FeedbackAuthorization> {
        Ok(build_authorization(
            agent_id,
            client_address,
            index_limit,
            expiry,
            chain_id,
            signer_address,
            unix_now()?,
        )?)
    }

    /// Sign an authorization with the adapter's signer.
    pub async fn sign_feedback_auth(
        &self,
        auth: FeedbackAuthorization,
    ) -> Result<SignedFeedbackAuthorization> {
        sign_authorization(auth, &self.domain(), self.adapter.as_ref()).await
    }

    /// Submit feedback about `agent_id`.
    ///
    /// Checked before any adapter call, in order: the score is in range, the
    /// authorization is for this agent, the adapter has a signer, the submitter is
    /// not the authorization's `signer_address` ([`SdkError::SelfFeedback`]), and the
    /// submitter is the authorized client.
    ///
    /// The self-feedback check only compares against the authorization's signer.
    /// Ownership and operator approval are not queried; the registry rejects those
    /// submissions on-chain and the rejection surfaces as an adapter error.
    pub async fn give_feedback(
        &self,
        agent_id: U256,
        score: u8,
        auth: &SignedFeedbackAuthorization,
        options: FeedbackOptions,
    ) -> Result<B256> {
        let score = Score::new(score)?;
        let fields = &auth.authorization;

        if fields.agent_id != agent_id {
            return Err(CoreError::InvalidParameter(format!(
                "authorization is for agent {}, not {agent_id}",
                fields.agent_id
            ))
            .into());
        }

        let sender = self.adapter.address().ok_or(SdkError::NoSigner)?;
        if sender == fields.signer_address {
            return Err(SdkError::SelfFeedback {
                agent_id,
                address: sender,
            });
        }
        if sender != fields.client_address {
            return Err(CoreError::InvalidParameter(format!(
                "authorization is for client {}, not {sender}",
                fields.client_address
            ))
            .into());
        }

        let call = ReputationRegistry::giveFeedbackCall {
            agentId: agent_id,
            score: score.value(),
            tag1: tag_hash(options.tag1.as_deref()),
            tag2: tag_hash(options.tag2.as_deref()),
            feedbackUri: options.feedback_uri.unwrap_or_default(),
            feedbackHash: options.feedback_hash.unwrap_or_default(),
            feedbackAuth: Bytes::from(auth.to_bytes()),
        };

        let outcome = contracts::write(self.adapter.as_ref(), self.address, call).await?;
        info!(%agent_id, %score, tx_hash = %outcome.tx_hash, "Feedback submitted");
        Ok(outcome.tx_hash)
    }

    /// Revoke feedback previously given by the adapter's signer.
    pub async fn revoke_feedback(&self, agent_id: U256, feedback_index: u64) -> Result<B256> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::revokeFeedbackCall {
                agentId: agent_id,
                feedbackIndex: feedback_index,
            },
        )
        .await?;
        Ok(outcome.tx_hash)
    }

    /// Attach a response to a feedback entry.
    pub async fn append_response(
        &self,
        agent_id: U256,
        client_address: Address,
        feedback_index: u64,
        response_uri: &str,
        response_hash: Option<B256>,
    ) -> Result<B256> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::appendResponseCall {
                agentId: agent_id,
                clientAddress: client_address,
                feedbackIndex: feedback_index,
                responseUri: response_uri.to_string(),
                responseHash: response_hash.unwrap_or_default(),
            },
        )
        .await?;
        Ok(outcome.tx_hash)
    }

    /// Identity Registry this registry is bound to.
    pub async fn get_identity_registry(&self) -> Result<Address> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::getIdentityRegistryCall {},
        )
        .await?;
        Ok(ret.identityRegistry)
    }

    /// Count and average score of feedback matching the filters.
    ///
    /// An empty client list and absent tags do not filter.
    pub async fn get_summary(
        &self,
        agent_id: U256,
        client_addresses: &[Address],
        tag1: Option<&str>,
        tag2: Option<&str>,
    ) -> Result<ReputationSummary> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::getSummaryCall {
                agentId: agent_id,
                clientAddresses: client_addresses.to_vec(),
                tag1: tag_hash(tag1),
                tag2: tag_hash(tag2),
            },
        )
        .await?;
        Ok(ReputationSummary {
            count: ret.count,
            average_score: ret.averageScore,
        })
    }

    /// A single feedback entry.
    pub async fn read_feedback(
        &self,
        agent_id: U256,
        client_address: Address,
        index: u64,
    ) -> Result<FeedbackRecord> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::readFeedbackCall {
                agentId: agent_id,
                clientAddress: client_address,
                index,
            },
        )
        .await?;
        Ok(FeedbackRecord {
            score: ret.score,
            tag1: ret.tag1,
            tag2: ret.tag2,
            is_revoked: ret.isRevoked,
        })
    }

    /// All feedback matching the filters.
    pub async fn read_all_feedback(
        &self,
        agent_id: U256,
        client_addresses: &[Address],
        tag1: Option<&str>,
        tag2: Option<&str>,
        include_revoked: bool,
    ) -> Result<FeedbackList> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::readAllFeedbackCall {
                agentId: agent_id,
                clientAddresses: client_addresses.to_vec(),
                tag1: tag_hash(tag1),
                tag2: tag_hash(tag2),
                includeRevoked: include_revoked,
            },
        )
        .await?;

        let list = FeedbackList {
            client_addresses: ret.clientAddresses,
            scores: ret.scores,
            tag1s: ret.tag1s,
            tag2s: ret.tag2s,
            revoked_statuses: ret.revokedStatuses,
        };
        let n = list.client_addresses.len();
        if [list.scores.len(), list.tag1s.len(), list.tag2s.len(), list.revoked_statuses.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(SdkError::Decode(
                "readAllFeedback returned columns of different lengths".to_string(),
            ));
        }
        Ok(list)
    }

    /// Number of responses to a feedback entry, optionally restricted to `responders`.
    pub async fn get_response_count(
        &self,
        agent_id: U256,
        client_address: Address,
        feedback_index: u64,
        responders: &[Address],
    ) -> Result<u64> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::getResponseCountCall {
                agentId: agent_id,
                clientAddress: client_address,
                feedbackIndex: feedback_index,
                responders: responders.to_vec(),
            },
        )
        .await?;
        Ok(ret._0)
    }

    /// Every client that has given feedback to an agent.
    pub async fn get_clients(&self, agent_id: U256) -> Result<Vec<Address>> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::getClientsCall { agentId: agent_id },
        )
        .await?;
        Ok(ret._0)
    }

    /// Index of the last feedback `client_address` gave to an agent (0 if none).
    pub async fn get_last_index(&self, agent_id: U256, client_address: Address) -> Result<u64> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ReputationRegistry::getLastIndexCall {
                agentId: agent_id,
                clientAddress: client_address,
            },
        )
        .await?;
        Ok(ret._0)
    }
}
