//! Identity Registry client.

use alloy::primitives::{Address, Bytes, B256, U256};
use erc8004_core::constants::IPFS_URI_PREFIX;
use erc8004_core::{AgentRegistrationFile, CoreError, MetadataEntry};
use std::sync::Arc;
use tracing::info;

use crate::adapter::{BlockchainAdapter, TransactionOutcome};
use crate::contracts::{self, IdentityRegistry};
use crate::error::{Result, SdkError};
use crate::storage::{fetch_json, ContentStore};

/// A newly minted agent identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Agent id assigned by the registry.
    pub agent_id: U256,
    /// Registering transaction.
    pub tx_hash: B256,
}

/// Client for the ERC-721 based Identity Registry.
#[derive(Clone)]
pub struct IdentityClient {
    adapter: Arc<dyn BlockchainAdapter>,
    address: Address,
}

impl IdentityClient {
    /// Client for the registry at `address`.
    pub fn new(adapter: Arc<dyn BlockchainAdapter>, address: Address) -> Self {
        Self { adapter, address }
    }

    /// Registry address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Register an agent without a token URI.
    pub async fn register(&self) -> Result<Registration> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::register_0Call {},
        )
        .await?;
        self.registration_from(&outcome)
    }

    /// Register an agent pointing at a registration file.
    pub async fn register_with_uri(&self, token_uri: &str) -> Result<Registration> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::register_1Call {
                tokenURI: token_uri.to_string(),
            },
        )
        .await?;
        self.registration_from(&outcome)
    }

    /// Register an agent with a token URI and on-chain metadata.
    pub async fn register_with_metadata(
        &self,
        token_uri: &str,
        metadata: &[MetadataEntry],
    ) -> Result<Registration> {
        let metadata = metadata
            .iter()
            .map(|entry| IdentityRegistry::MetadataEntry {
                key: entry.key.clone(),
                value: Bytes::copy_from_slice(entry.value.as_bytes()),
            })
            .collect();

        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::register_2Call {
                tokenURI: token_uri.to_string(),
                metadata,
            },
        )
        .await?;
        self.registration_from(&outcome)
    }

    fn registration_from(&self, outcome: &TransactionOutcome) -> Result<Registration> {
        let event: IdentityRegistry::Registered = contracts::find_event(outcome, self.address)
            .ok_or(SdkError::MissingEvent {
                event: "Registered",
                tx_hash: outcome.tx_hash,
            })?;

        info!(agent_id = %event.agentId, owner = %event.owner, "Agent registered");
        Ok(Registration {
            agent_id: event.agentId,
            tx_hash: outcome.tx_hash,
        })
    }

    /// Token URI of an agent.
    pub async fn token_uri(&self, agent_id: U256) -> Result<String> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::tokenURICall { tokenId: agent_id },
        )
        .await?;
        Ok(ret._0)
    }

    /// Point an agent at a new registration file.
    pub async fn set_token_uri(&self, agent_id: U256, uri: &str) -> Result<B256> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::setTokenURICall {
                agentId: agent_id,
                newUri: uri.to_string(),
            },
        )
        .await?;
        Ok(outcome.tx_hash)
    }

    /// Current owner of an agent.
    pub async fn owner_of(&self, agent_id: U256) -> Result<Address> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::ownerOfCall { tokenId: agent_id },
        )
        .await?;
        Ok(ret._0)
    }

    /// Metadata value stored under `key`, decoded as UTF-8.
    pub async fn get_metadata(&self, agent_id: U256, key: &str) -> Result<String> {
        let ret = contracts::read(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::getMetadataCall {
                agentId: agent_id,
                key: key.to_string(),
            },
        )
        .await?;

        String::from_utf8(ret._0.to_vec())
            .map_err(|e| SdkError::decode(&format!("metadata {key:?}"), e))
    }

    /// Store a metadata value under `key`.
    pub async fn set_metadata(&self, agent_id: U256, key: &str, value: &str) -> Result<B256> {
        let outcome = contracts::write(
            self.adapter.as_ref(),
            self.address,
            IdentityRegistry::setMetadataCall {
                agentId: agent_id,
                key: key.to_string(),
                value: Bytes::copy_from_slice(value.as_bytes()),
            },
        )
        .await?;
        Ok(outcome.tx_hash)
    }

    /// Fetch and parse the registration file an agent's token URI points at.
    ///
    /// Only `ipfs://` URIs are resolved. The file is not checked against anything:
    /// advertised endpoints are claims, not guarantees.
    pub async fn registration_file(
        &self,
        agent_id: U256,
        store: &dyn ContentStore,
    ) -> Result<AgentRegistrationFile> {
        let uri = self.token_uri(agent_id).await?;
        if !uri.starts_with(IPFS_URI_PREFIX) {
            return Err(CoreError::InvalidParameter(format!(
                "unsupported token URI scheme: {uri:?}"
            ))
            .into());
        }
        Ok(fetch_json(store, &uri).await?)
    }
}
