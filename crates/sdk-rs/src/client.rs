//! Aggregate client over the three registries.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use erc8004_core::ContractAddresses;
use std::sync::Arc;
use tracing::info;

use crate::adapter::{AlloyAdapter, BlockchainAdapter};
use crate::config::SdkConfig;
use crate::identity::IdentityClient;
use crate::reputation::ReputationClient;
use crate::validation::ValidationClient;

/// Identity, reputation and validation clients sharing one adapter.
///
/// # Example
/// ```no_run
/// # use erc8004_sdk::{config::SdkConfig, Erc8004Client};
/// # async fn run() -> anyhow::Result<()> {
/// let config = SdkConfig::from_file("erc8004.toml")?;
/// let client = Erc8004Client::from_config(&config)?;
/// let owner = client.identity.owner_of(erc8004_core::U256::from(1)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Erc8004Client {
    adapter: Arc<dyn BlockchainAdapter>,
    addresses: ContractAddresses,
    /// Identity Registry client.
    pub identity: IdentityClient,
    /// Reputation Registry client.
    pub reputation: ReputationClient,
    /// Validation Registry client.
    pub validation: ValidationClient,
}

impl Erc8004Client {
    /// Bundle clients for `addresses` over `adapter`.
    pub fn new(adapter: Arc<dyn BlockchainAdapter>, addresses: ContractAddresses) -> Self {
        Self {
            identity: IdentityClient::new(adapter.clone(), addresses.identity_registry),
            reputation: ReputationClient::new(adapter.clone(), addresses.reputation_registry),
            validation: ValidationClient::new(adapter.clone(), addresses.validation_registry),
            adapter,
            addresses,
        }
    }

    /// Build an alloy-backed client from configuration.
    ///
    /// Without a configured private key the client is read-only.
    pub fn from_config(config: &SdkConfig) -> Result<Self> {
        let options = config.adapter_options();
        let adapter: Arc<dyn BlockchainAdapter> = match config.signer()? {
            Some(signer) => {
                info!(address = %signer.address(), "Using local signer");
                Arc::new(
                    AlloyAdapter::with_signer(&config.network.rpc_url, signer, options)
                        .context("Failed to create signing adapter")?,
                )
            }
            None => {
                info!("No signer configured, client is read-only");
                Arc::new(
                    AlloyAdapter::read_only(&config.network.rpc_url, options)
                        .context("Failed to create read-only adapter")?,
                )
            }
        };

        Ok(Self::new(adapter, config.contract_addresses()))
    }

    /// Signer address, or `None` in read-only mode.
    pub fn address(&self) -> Option<Address> {
        self.adapter.address()
    }

    /// Chain the adapter is connected to.
    pub async fn chain_id(&self) -> crate::Result<u64> {
        Ok(self.adapter.chain_id().await?)
    }

    /// Registry addresses in use.
    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    /// Shared adapter.
    pub fn adapter(&self) -> Arc<dyn BlockchainAdapter> {
        self.adapter.clone()
    }
}
