//! ABI bindings for the ERC-8004 registries (feedback-authorization version).
//!
//! Only the call/event types are generated: calldata is handed to a
//! [`BlockchainAdapter`](crate::adapter::BlockchainAdapter), never to an alloy
//! contract instance.

use alloy::primitives::{Address, Bytes};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use tracing::debug;

use crate::adapter::{BlockchainAdapter, TransactionOutcome};
use crate::error::{Result, SdkError};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract IdentityRegistry {
        struct MetadataEntry {
            string key;
            bytes value;
        }

        event Registered(uint256 indexed agentId, string tokenURI, address indexed owner);
        event MetadataSet(uint256 indexed agentId, string indexed indexedKey, string key, bytes value);

        function register() external returns (uint256 agentId);
        function register(string tokenURI) external returns (uint256 agentId);
        function register(string tokenURI, MetadataEntry[] metadata) external returns (uint256 agentId);

        function tokenURI(uint256 tokenId) external view returns (string);
        function setTokenURI(uint256 agentId, string newUri) external;
        function ownerOf(uint256 tokenId) external view returns (address);

        function getMetadata(uint256 agentId, string key) external view returns (bytes);
        function setMetadata(uint256 agentId, string key, bytes value) external;
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract ReputationRegistry {
        event NewFeedback(
            uint256 indexed agentId,
            address indexed clientAddress,
            uint8 score,
            bytes32 indexed tag1,
            bytes32 tag2,
            string feedbackUri,
            bytes32 feedbackHash
        );
        event FeedbackRevoked(uint256 indexed agentId, address indexed clientAddress, uint64 indexed feedbackIndex);
        event ResponseAppended(
            uint256 indexed agentId,
            address indexed clientAddress,
            uint64 feedbackIndex,
            address indexed responder,
            string responseUri,
            bytes32 responseHash
        );

        function giveFeedback(
            uint256 agentId,
            uint8 score,
            bytes32 tag1,
            bytes32 tag2,
            string feedbackUri,
            bytes32 feedbackHash,
            bytes feedbackAuth
        ) external;
        function revokeFeedback(uint256 agentId, uint64 feedbackIndex) external;
        function appendResponse(
            uint256 agentId,
            address clientAddress,
            uint64 feedbackIndex,
            string responseUri,
            bytes32 responseHash
        ) external;

        function getIdentityRegistry() external view returns (address identityRegistry);
        function getSummary(uint256 agentId, address[] clientAddresses, bytes32 tag1, bytes32 tag2)
            external view returns (uint64 count, uint8 averageScore);
        function readFeedback(uint256 agentId, address clientAddress, uint64 index)
            external view returns (uint8 score, bytes32 tag1, bytes32 tag2, bool isRevoked);
        function readAllFeedback(
            uint256 agentId,
            address[] clientAddresses,
            bytes32 tag1,
            bytes32 tag2,
            bool includeRevoked
        ) external view returns (
            address[] clientAddresses,
            uint8[] scores,
            bytes32[] tag1s,
            bytes32[] tag2s,
            bool[] revokedStatuses
        );
        function getResponseCount(uint256 agentId, address clientAddress, uint64 feedbackIndex, address[] responders)
            external view returns (uint64);
        function getClients(uint256 agentId) external view returns (address[]);
        function getLastIndex(uint256 agentId, address clientAddress) external view returns (uint64);
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract ValidationRegistry {
        event ValidationRequest(
            address indexed validatorAddress,
            uint256 indexed agentId,
            string requestUri,
            bytes32 indexed requestHash
        );
        event ValidationResponse(
            address indexed validatorAddress,
            uint256 indexed agentId,
            bytes32 indexed requestHash,
            uint8 response,
            string responseUri,
            bytes32 responseHash,
            bytes32 tag
        );

        function validationRequest(address validatorAddress, uint256 agentId, string requestUri, bytes32 requestHash) external;
        function validationResponse(bytes32 requestHash, uint8 response, string responseUri, bytes32 responseHash, bytes32 tag) external;

        function getIdentityRegistry() external view returns (address identityRegistry);
        function getValidationStatus(bytes32 requestHash) external view returns (
            address validatorAddress,
            uint256 agentId,
            uint8 response,
            bytes32 responseHash,
            bytes32 tag,
            uint256 lastUpdate
        );
        function getSummary(uint256 agentId, address[] validatorAddresses, bytes32 tag)
            external view returns (uint64 count, uint8 avgResponse);
        function getAgentValidations(uint256 agentId) external view returns (bytes32[] requestHashes);
        function getValidatorRequests(address validatorAddress) external view returns (bytes32[] requestHashes);
    }
}

/// Execute a view call and decode its return values.
pub(crate) async fn read<C: SolCall>(
    adapter: &dyn BlockchainAdapter,
    contract: Address,
    call: C,
) -> Result<C::Return> {
    debug!(%contract, function = C::SIGNATURE, "read");
    let data = adapter.call(contract, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&data, true).map_err(|e| SdkError::decode(C::SIGNATURE, e))
}

/// Submit a state-changing call. Fails with [`SdkError::NoSigner`] on a read-only
/// adapter without touching the network.
pub(crate) async fn write<C: SolCall>(
    adapter: &dyn BlockchainAdapter,
    contract: Address,
    call: C,
) -> Result<TransactionOutcome> {
    if adapter.address().is_none() {
        return Err(SdkError::NoSigner);
    }
    debug!(%contract, function = C::SIGNATURE, "write");
    Ok(adapter.send(contract, Bytes::from(call.abi_encode())).await?)
}

/// First `E` emitted by `contract` in a transaction.
pub(crate) fn find_event<E: SolEvent>(
    outcome: &TransactionOutcome,
    contract: Address,
) -> Option<E> {
    outcome
        .logs
        .iter()
        .filter(|log| log.address == contract)
        .filter(|log| log.topics.first() == Some(&E::SIGNATURE_HASH))
        .find_map(|log| E::decode_raw_log(log.topics.iter().copied(), &log.data, true).ok())
}
