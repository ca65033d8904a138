//! Validation Registry client.

use alloy::primitives::{Address, B256, U256};
use erc8004_core::{tag_hash, Score, ValidationStatus, ValidationSummary};
use std::sync::Arc;
use tracing::info;

use crate::adapter::BlockchainAdapter;
use crate::contracts::{self, ValidationRegistry};
use crate::error::Result;

/// Client for the Validation Registry.
#[derive(Clone)]
pub struct ValidationClient {
    adapter: Arc<dyn BlockchainAdapter>,
    address: Address,
}

impl ValidationClient {
    /// Client for the registry at `address`.
    pub fn new(adapter: Arc<dyn BlockchainAdapter>, address: Address) -> Self {
        Self { adapter, address }
    }

    /// Registry address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Ask `validator_address` to validate an agent's work.
    ///
    /// Must be sent by the agent's owner or operator. `request_hash` commits to the
    /// request document and identifies the request from then on.
    pub async fn validation_request(
        &self,
        validator_address: Address,
        agent_id: U256,
        request_uri: &str,
        request_hash: B256,
    ) -> Result<B256> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::validationRequestCall {
                validatorAddress: validator_address,
                agentId: agent_id,
                requestUri: request_uri.to_string(),
                requestHash: request_hash,
            },
        )
        .await?;
        info!(%agent_id, validator = %validator_address, %request_hash, "Validation requested");
        Ok(outcome.tx_hash)
    }

    /// Respond to a request addressed to the adapter's signer. May be repeated.
    pub async fn validation_response(
        &self,
        request_hash: B256,
        response: u8,
        response_uri: Option<&str>,
        response_hash: Option<B256>,
        tag: Option<&str>,
    ) -> Result<B256> {
        let response = Score::new(response)?;
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::validationResponseCall {
                requestHash: request_hash,
                response: response.value(),
                responseUri: response_uri.unwrap_or_default().to_string(),
                responseHash: response_hash.unwrap_or_default(),
                tag: tag_hash(tag),
            },
        )
        .await?;
        info!(%request_hash, %response, "Validation response submitted");
        Ok(outcome.tx_hash)
    }

    /// Identity Registry this registry is bound to.
    pub async fn get_identity_registry(&self) -> Result<Address> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::getIdentityRegistryCall {},
        )
        .await?;
        Ok(ret.identityRegistry)
    }

    /// Latest state of a validation request.
    pub async fn get_validation_status(&self, request_hash: B256) -> Result<ValidationStatus> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::getValidationStatusCall {
                requestHash: request_hash,
            },
        )
        .await?;
        Ok(ValidationStatus {
            validator_address: ret.validatorAddress,
            agent_id: ret.agentId,
            response: ret.response,
            response_hash: ret.responseHash,
            tag: ret.tag,
            last_update: ret.lastUpdate,
        })
    }

    /// Count and average response of validations matching the filters.
    pub async fn get_summary(
        &self,
        agent_id: U256,
        validator_addresses: &[Address],
        tag: Option<&str>,
    ) -> Result<ValidationSummary> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::getSummaryCall {
                agentId: agent_id,
                validatorAddresses: validator_addresses.to_vec(),
                tag: tag_hash(tag),
            },
        )
        .await?;
        Ok(ValidationSummary {
            count: ret.count,
            average_response: ret.avgResponse,
        })
    }

    /// Request hashes concerning an agent.
    pub async fn get_agent_validations(&self, agent_id: U256) -> Result<Vec<B256>> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::getAgentValidationsCall { agentId: agent_id },
        )
        .await?;
        Ok(ret.requestHashes)
    }

    /// Request hashes addressed to a validator.
    pub async fn get_validator_requests(&self, validator_address: Address) -> Result<Vec<B256>> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            ValidationRegistry::getValidatorRequestsCall {
                validatorAddress: validator_address,
            },
        )
        .await?;
        Ok(ret.requestHashes)
    }
}
