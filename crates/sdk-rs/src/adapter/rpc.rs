//! JSON-RPC backend built on an alloy HTTP provider.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, PrimitiveSignature};
use alloy::providers::{
    PendingTransactionError, Provider, ProviderBuilder, RootProvider, WatchTxError,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol_types::decode_revert_reason;
use alloy::transports::http::{Client, Http};
use alloy::transports::{RpcError, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use erc8004_core::TypedData;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AdapterError, BlockchainAdapter, EventLog, TransactionOutcome};

// Provider stack produced by `with_recommended_fillers().wallet(..).on_http(..)`
type WalletProvider = alloy::providers::fillers::FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::fillers::JoinFill<
            alloy::providers::Identity,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::GasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::BlobGasFiller,
                    alloy::providers::fillers::JoinFill<
                        alloy::providers::fillers::NonceFiller,
                        alloy::providers::fillers::ChainIdFiller,
                    >,
                >,
            >,
        >,
        alloy::providers::fillers::WalletFiller<EthereumWallet>,
    >,
    RootProvider<Http<Client>>,
    Http<Client>,
    alloy::network::Ethereum,
>;

/// Timeouts and confirmation depth of an [`AlloyAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Upper bound for a single RPC request.
    pub request_timeout: Duration,
    /// Upper bound for waiting on a receipt after submission.
    pub receipt_timeout: Duration,
    /// Blocks to wait for before a transaction counts as included.
    pub confirmations: u64,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            receipt_timeout: Duration::from_secs(120),
            confirmations: 1,
        }
    }
}

/// [`BlockchainAdapter`] over an alloy HTTP provider.
///
/// Writes from one adapter are serialized so that nonces are assigned in submission
/// order. Nothing is retried.
pub struct AlloyAdapter<P> {
    provider: P,
    signer: Option<PrivateKeySigner>,
    options: AdapterOptions,
    write_lock: Mutex<()>,
}

impl AlloyAdapter<RootProvider<Http<Client>>> {
    /// Adapter without a signer: reads only.
    pub fn read_only(rpc_url: &str, options: AdapterOptions) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
            signer: None,
            options,
            write_lock: Mutex::new(()),
        })
    }
}

impl AlloyAdapter<WalletProvider> {
    /// Adapter that signs transactions and typed data with `signer`.
    pub fn with_signer(
        rpc_url: &str,
        signer: PrivateKeySigner,
        options: AdapterOptions,
    ) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let wallet = EthereumWallet::from(signer.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(url);

        Ok(Self {
            provider,
            signer: Some(signer),
            options,
            write_lock: Mutex::new(()),
        })
    }
}

impl<P> AlloyAdapter<P> {
    async fn bounded<T, F>(&self, fut: F) -> Result<T, AdapterError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.options.request_timeout, fut).await {
            Ok(result) => result.map_err(map_rpc_error),
            Err(_) => Err(AdapterError::Timeout(self.options.request_timeout)),
        }
    }
}

#[async_trait]
impl<P> BlockchainAdapter for AlloyAdapter<P>
where
    P: Provider<Http<Client>> + 'static,
{
    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes, AdapterError> {
        debug!(%contract, len = calldata.len(), "eth_call");
        let tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(calldata);
        self.bounded(async { self.provider.call(&tx).await }).await
    }

    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
    ) -> Result<TransactionOutcome, AdapterError> {
        let Some(signer) = &self.signer else {
            return Err(AdapterError::Signing(
                "adapter was created without a signer".to_string(),
            ));
        };

        let _guard = self.write_lock.lock().await;

        let tx = TransactionRequest::default()
            .with_from(signer.address())
            .with_to(contract)
            .with_input(calldata);

        let pending = self
            .bounded(async { self.provider.send_transaction(tx).await })
            .await?;
        let tx_hash = *pending.tx_hash();
        info!(%contract, %tx_hash, "Transaction submitted");

        let receipt = pending
            .with_required_confirmations(self.options.confirmations)
            .with_timeout(Some(self.options.receipt_timeout))
            .get_receipt()
            .await
            .map_err(|e| map_pending_error(e, self.options.receipt_timeout))?;

        let outcome = outcome_from_receipt(&receipt);
        if !outcome.success {
            warn!(%contract, %tx_hash, "Transaction reverted");
            return Err(AdapterError::RejectedTransaction { reason: None });
        }

        info!(
            %tx_hash,
            block = outcome.block_number.unwrap_or_default(),
            logs = outcome.logs.len(),
            "Transaction confirmed"
        );
        Ok(outcome)
    }

    async fn sign_typed_data(
        &self,
        payload: &TypedData,
    ) -> Result<PrimitiveSignature, AdapterError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AdapterError::Signing("no signer configured".to_string()))?;

        let digest = payload
            .eip712_signing_hash()
            .map_err(|e| AdapterError::Signing(format!("invalid typed data: {e}")))?;

        signer
            .sign_hash(&digest)
            .await
            .map_err(|e| AdapterError::Signing(e.to_string()))
    }

    fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn chain_id(&self) -> Result<u64, AdapterError> {
        self.bounded(async { self.provider.get_chain_id().await })
            .await
    }
}

fn outcome_from_receipt(receipt: &TransactionReceipt) -> TransactionOutcome {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| EventLog {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
        .collect();

    TransactionOutcome {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        success: receipt.status(),
        logs,
    }
}

fn map_rpc_error(err: TransportError) -> AdapterError {
    match err {
        RpcError::ErrorResp(payload) => {
            let reason = payload
                .as_revert_data()
                .and_then(|data| decode_revert_reason(&data))
                .unwrap_or_else(|| payload.message.to_string());
            warn!(code = payload.code, %reason, "RPC call rejected");
            AdapterError::RejectedTransaction {
                reason: Some(reason),
            }
        }
        RpcError::Transport(kind) => AdapterError::Connection(kind.to_string()),
        other => AdapterError::Backend(other.to_string()),
    }
}

fn map_pending_error(err: PendingTransactionError, waited: Duration) -> AdapterError {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => AdapterError::Timeout(waited),
        PendingTransactionError::TransportError(e) => map_rpc_error(e),
        other => AdapterError::Backend(other.to_string()),
    }
}
