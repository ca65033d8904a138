#![allow(dead_code)]

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::{SolCall, SolEvent, SolInterface};
use async_trait::async_trait;
use erc8004_core::{
    keccak256, Address, AuthorizationDomain, Bytes, ContractAddresses, PrimitiveSignature,
    SignedFeedbackAuthorization, TypedData, B256, U256,
};
use erc8004_sdk::adapter::EventLog;
use erc8004_sdk::contracts::{
    IdentityRegistry::{self, IdentityRegistryCalls},
    ReputationRegistry::{self, ReputationRegistryCalls},
    ValidationRegistry::{self, ValidationRegistryCalls},
};
use erc8004_sdk::{AdapterError, BlockchainAdapter, TransactionOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CHAIN_ID: u64 = 31337;

pub fn addresses() -> ContractAddresses {
    ContractAddresses {
        identity_registry: Address::repeat_byte(0x11),
        reputation_registry: Address::repeat_byte(0x22),
        validation_registry: Address::repeat_byte(0x33),
        chain_id: CHAIN_ID,
    }
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Deterministic test key.
pub fn signer(byte: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::repeat_byte(byte)).unwrap()
}

// ---------------------------------------------------------------------------
// Mock adapter
// ---------------------------------------------------------------------------

/// Adapter that answers every request the same way and counts what it was asked.
pub struct MockAdapter {
    pub address: Option<Address>,
    pub signature: PrimitiveSignature,
    pub failure: Option<AdapterError>,
    pub calls: AtomicUsize,
    pub sends: AtomicUsize,
    pub signs: AtomicUsize,
}

impl MockAdapter {
    pub fn new(address: Option<Address>) -> Self {
        Self {
            address,
            signature: fixed_signature(),
            failure: None,
            calls: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            signs: AtomicUsize::new(0),
        }
    }

    pub fn failing(address: Option<Address>, err: AdapterError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new(address)
        }
    }

    pub fn network_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst) + self.sends.load(Ordering::SeqCst)
    }
}

pub fn fixed_signature() -> PrimitiveSignature {
    PrimitiveSignature::new(U256::from(0x1111u64), U256::from(0x2222u64), true)
}

#[async_trait]
impl BlockchainAdapter for MockAdapter {
    async fn call(&self, _contract: Address, _calldata: Bytes) -> Result<Bytes, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(Bytes::new()),
        }
    }

    async fn send(
        &self,
        _contract: Address,
        _calldata: Bytes,
    ) -> Result<TransactionOutcome, AdapterError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(TransactionOutcome {
                tx_hash: B256::repeat_byte(0xee),
                block_number: Some(1),
                success: true,
                logs: Vec::new(),
            }),
        }
    }

    async fn sign_typed_data(
        &self,
        _payload: &TypedData,
    ) -> Result<PrimitiveSignature, AdapterError> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        Ok(self.signature)
    }

    fn address(&self) -> Option<Address> {
        self.address
    }

    async fn chain_id(&self) -> Result<u64, AdapterError> {
        Ok(CHAIN_ID)
    }
}

// ---------------------------------------------------------------------------
// In-memory ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Feedback {
    score: u8,
    tag1: B256,
    tag2: B256,
    revoked: bool,
}

#[derive(Debug, Clone)]
struct Validation {
    validator: Address,
    agent_id: U256,
    response: u8,
    response_hash: B256,
    tag: B256,
    last_update: U256,
}

#[derive(Default)]
struct LedgerState {
    tx_count: u64,
    next_agent_id: u64,
    owners: HashMap<U256, Address>,
    token_uris: HashMap<U256, String>,
    metadata: HashMap<(U256, String), Bytes>,
    feedback: HashMap<(U256, Address), Vec<Feedback>>,
    clients: HashMap<U256, Vec<Address>>,
    validations: HashMap<B256, Validation>,
    agent_validations: HashMap<U256, Vec<B256>>,
    validator_requests: HashMap<Address, Vec<B256>>,
}

/// Shared registry state that several signers can connect to.
#[derive(Clone)]
pub struct Ledger {
    addresses: ContractAddresses,
    state: Arc<Mutex<LedgerState>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            addresses: addresses(),
            state: Arc::new(Mutex::new(LedgerState {
                next_agent_id: 1,
                ..Default::default()
            })),
        }
    }

    pub fn addresses(&self) -> ContractAddresses {
        self.addresses
    }

    pub fn connect(&self, signer: PrivateKeySigner) -> Arc<LedgerAdapter> {
        Arc::new(LedgerAdapter {
            ledger: self.clone(),
            signer: Some(signer),
        })
    }

    pub fn read_only(&self) -> Arc<LedgerAdapter> {
        Arc::new(LedgerAdapter {
            ledger: self.clone(),
            signer: None,
        })
    }

    pub fn transaction_count(&self) -> u64 {
        self.state.lock().unwrap().tx_count
    }

    fn execute(
        &self,
        sender: Address,
        contract: Address,
        calldata: &[u8],
    ) -> Result<Vec<EventLog>, AdapterError> {
        let mut state = self.state.lock().unwrap();
        let logs = if contract == self.addresses.identity_registry {
            self.execute_identity(&mut state, sender, contract, calldata)?
        } else if contract == self.addresses.reputation_registry {
            self.execute_reputation(&mut state, sender, contract, calldata)?
        } else if contract == self.addresses.validation_registry {
            self.execute_validation(&mut state, sender, contract, calldata)?
        } else {
            return Err(AdapterError::rejected("no contract at address"));
        };
        state.tx_count += 1;
        Ok(logs)
    }

    fn execute_identity(
        &self,
        state: &mut LedgerState,
        sender: Address,
        contract: Address,
        calldata: &[u8],
    ) -> Result<Vec<EventLog>, AdapterError> {
        let call = IdentityRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)?;
        let (uri, metadata) = match call {
            IdentityRegistryCalls::register_0(_) => (String::new(), Vec::new()),
            IdentityRegistryCalls::register_1(c) => (c.tokenURI, Vec::new()),
            IdentityRegistryCalls::register_2(c) => (c.tokenURI, c.metadata),
            IdentityRegistryCalls::setTokenURI(c) => {
                require_owner(state, c.agentId, sender)?;
                state.token_uris.insert(c.agentId, c.newUri);
                return Ok(Vec::new());
            }
            IdentityRegistryCalls::setMetadata(c) => {
                require_owner(state, c.agentId, sender)?;
                let event = IdentityRegistry::MetadataSet {
                    agentId: c.agentId,
                    indexedKey: keccak256(c.key.as_bytes()),
                    key: c.key.clone(),
                    value: c.value.clone(),
                };
                state.metadata.insert((c.agentId, c.key), c.value);
                return Ok(vec![log(contract, &event)]);
            }
            _ => return Err(AdapterError::rejected("not a transaction")),
        };

        let agent_id = U256::from(state.next_agent_id);
        state.next_agent_id += 1;
        state.owners.insert(agent_id, sender);
        state.token_uris.insert(agent_id, uri.clone());
        for entry in metadata {
            state.metadata.insert((agent_id, entry.key), entry.value);
        }

        Ok(vec![log(
            contract,
            &IdentityRegistry::Registered {
                agentId: agent_id,
                tokenURI: uri,
                owner: sender,
            },
        )])
    }

    fn execute_reputation(
        &self,
        state: &mut LedgerState,
        sender: Address,
        contract: Address,
        calldata: &[u8],
    ) -> Result<Vec<EventLog>, AdapterError> {
        match ReputationRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)? {
            ReputationRegistryCalls::giveFeedback(c) => {
                if c.score > 100 {
                    return Err(AdapterError::rejected("score>100"));
                }
                let owner = *state
                    .owners
                    .get(&c.agentId)
                    .ok_or_else(|| AdapterError::rejected("Agent does not exist"))?;
                if sender == owner {
                    return Err(AdapterError::rejected("Self-feedback not allowed"));
                }

                let auth = SignedFeedbackAuthorization::from_bytes(&c.feedbackAuth)
                    .map_err(|e| AdapterError::rejected(e.to_string()))?;
                auth.verify(&AuthorizationDomain::new(contract))
                    .map_err(|_| AdapterError::rejected("Invalid signature"))?;

                let fields = &auth.authorization;
                let entries = state.feedback.entry((c.agentId, sender)).or_default();
                if fields.agent_id != c.agentId {
                    return Err(AdapterError::rejected("AgentId mismatch"));
                }
                if fields.client_address != sender {
                    return Err(AdapterError::rejected("Client mismatch"));
                }
                if fields.index_limit <= entries.len() as u64 {
                    return Err(AdapterError::rejected("IndexLimit exceeded"));
                }
                if fields.expiry <= now() {
                    return Err(AdapterError::rejected("Auth expired"));
                }
                if fields.chain_id != CHAIN_ID {
                    return Err(AdapterError::rejected("ChainId mismatch"));
                }
                if fields.signer_address != owner {
                    return Err(AdapterError::rejected("Signer not authorized"));
                }

                entries.push(Feedback {
                    score: c.score,
                    tag1: c.tag1,
                    tag2: c.tag2,
                    revoked: false,
                });
                let clients = state.clients.entry(c.agentId).or_default();
                if !clients.contains(&sender) {
                    clients.push(sender);
                }

                Ok(vec![log(
                    contract,
                    &ReputationRegistry::NewFeedback {
                        agentId: c.agentId,
                        clientAddress: sender,
                        score: c.score,
                        tag1: c.tag1,
                        tag2: c.tag2,
                        feedbackUri: c.feedbackUri,
                        feedbackHash: c.feedbackHash,
                    },
                )])
            }
            ReputationRegistryCalls::revokeFeedback(c) => {
                let index = usize::try_from(c.feedbackIndex)
                    .ok()
                    .and_then(|i| i.checked_sub(1));
                let entry = match (state.feedback.get_mut(&(c.agentId, sender)), index) {
                    (Some(entries), Some(i)) => entries.get_mut(i),
                    _ => None,
                }
                .ok_or_else(|| AdapterError::rejected("index out of bounds"))?;
                entry.revoked = true;
                Ok(vec![log(
                    contract,
                    &ReputationRegistry::FeedbackRevoked {
                        agentId: c.agentId,
                        clientAddress: sender,
                        feedbackIndex: c.feedbackIndex,
                    },
                )])
            }
            _ => Err(AdapterError::rejected("not a transaction")),
        }
    }

    fn execute_validation(
        &self,
        state: &mut LedgerState,
        sender: Address,
        contract: Address,
        calldata: &[u8],
    ) -> Result<Vec<EventLog>, AdapterError> {
        match ValidationRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)? {
            ValidationRegistryCalls::validationRequest(c) => {
                require_owner(state, c.agentId, sender)?;
                if state.validations.contains_key(&c.requestHash) {
                    return Err(AdapterError::rejected("exists"));
                }
                state.validations.insert(
                    c.requestHash,
                    Validation {
                        validator: c.validatorAddress,
                        agent_id: c.agentId,
                        response: 0,
                        response_hash: B256::ZERO,
                        tag: B256::ZERO,
                        last_update: U256::from(now()),
                    },
                );
                state
                    .agent_validations
                    .entry(c.agentId)
                    .or_default()
                    .push(c.requestHash);
                state
                    .validator_requests
                    .entry(c.validatorAddress)
                    .or_default()
                    .push(c.requestHash);
                Ok(vec![log(
                    contract,
                    &ValidationRegistry::ValidationRequest {
                        validatorAddress: c.validatorAddress,
                        agentId: c.agentId,
                        requestUri: c.requestUri,
                        requestHash: c.requestHash,
                    },
                )])
            }
            ValidationRegistryCalls::validationResponse(c) => {
                let validation = state
                    .validations
                    .get_mut(&c.requestHash)
                    .ok_or_else(|| AdapterError::rejected("unknown"))?;
                if validation.validator != sender {
                    return Err(AdapterError::rejected("not validator"));
                }
                if c.response > 100 {
                    return Err(AdapterError::rejected("resp>100"));
                }
                validation.response = c.response;
                validation.response_hash = c.responseHash;
                validation.tag = c.tag;
                validation.last_update = U256::from(now());
                Ok(vec![log(
                    contract,
                    &ValidationRegistry::ValidationResponse {
                        validatorAddress: sender,
                        agentId: validation.agent_id,
                        requestHash: c.requestHash,
                        response: c.response,
                        responseUri: c.responseUri,
                        responseHash: c.responseHash,
                        tag: c.tag,
                    },
                )])
            }
            _ => Err(AdapterError::rejected("not a transaction")),
        }
    }

    fn query(&self, contract: Address, calldata: &[u8]) -> Result<Vec<u8>, AdapterError> {
        let state = self.state.lock().unwrap();
        if contract == self.addresses.identity_registry {
            query_identity(&state, calldata)
        } else if contract == self.addresses.reputation_registry {
            query_reputation(&state, &self.addresses, calldata)
        } else if contract == self.addresses.validation_registry {
            query_validation(&state, &self.addresses, calldata)
        } else {
            // An empty account answers with empty return data.
            Ok(Vec::new())
        }
    }
}

fn query_identity(state: &LedgerState, calldata: &[u8]) -> Result<Vec<u8>, AdapterError> {
    match IdentityRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)? {
        IdentityRegistryCalls::tokenURI(c) => {
            let uri = state
                .token_uris
                .get(&c.tokenId)
                .cloned()
                .ok_or_else(|| AdapterError::rejected("ERC721NonexistentToken"))?;
            Ok(IdentityRegistry::tokenURICall::abi_encode_returns(&(uri,)))
        }
        IdentityRegistryCalls::ownerOf(c) => {
            let owner = *state
                .owners
                .get(&c.tokenId)
                .ok_or_else(|| AdapterError::rejected("ERC721NonexistentToken"))?;
            Ok(IdentityRegistry::ownerOfCall::abi_encode_returns(&(owner,)))
        }
        IdentityRegistryCalls::getMetadata(c) => {
            let value = state
                .metadata
                .get(&(c.agentId, c.key))
                .cloned()
                .unwrap_or_default();
            Ok(IdentityRegistry::getMetadataCall::abi_encode_returns(&(value,)))
        }
        _ => Err(AdapterError::rejected("not a view")),
    }
}

fn query_reputation(
    state: &LedgerState,
    addresses: &ContractAddresses,
    calldata: &[u8],
) -> Result<Vec<u8>, AdapterError> {
    match ReputationRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)? {
        ReputationRegistryCalls::getIdentityRegistry(_) => Ok(
            ReputationRegistry::getIdentityRegistryCall::abi_encode_returns(&(
                addresses.identity_registry,
            )),
        ),
        ReputationRegistryCalls::getSummary(c) => {
            let rows = matching_feedback(state, c.agentId, &c.clientAddresses, c.tag1, c.tag2, false);
            let count = rows.len() as u64;
            let average = if count == 0 {
                0
            } else {
                (rows.iter().map(|(_, f)| f.score as u64).sum::<u64>() / count) as u8
            };
            Ok(ReputationRegistry::getSummaryCall::abi_encode_returns(&(
                count, average,
            )))
        }
        ReputationRegistryCalls::readFeedback(c) => {
            let entry = state
                .feedback
                .get(&(c.agentId, c.clientAddress))
                .and_then(|entries| entries.get((c.index as usize).wrapping_sub(1)))
                .ok_or_else(|| AdapterError::rejected("index out of bounds"))?;
            Ok(ReputationRegistry::readFeedbackCall::abi_encode_returns(&(
                entry.score,
                entry.tag1,
                entry.tag2,
                entry.revoked,
            )))
        }
        ReputationRegistryCalls::readAllFeedback(c) => {
            let rows = matching_feedback(
                state,
                c.agentId,
                &c.clientAddresses,
                c.tag1,
                c.tag2,
                c.includeRevoked,
            );
            let clients: Vec<Address> = rows.iter().map(|(a, _)| *a).collect();
            let scores: Vec<u8> = rows.iter().map(|(_, f)| f.score).collect();
            let tag1s: Vec<B256> = rows.iter().map(|(_, f)| f.tag1).collect();
            let tag2s: Vec<B256> = rows.iter().map(|(_, f)| f.tag2).collect();
            let revoked: Vec<bool> = rows.iter().map(|(_, f)| f.revoked).collect();
            Ok(ReputationRegistry::readAllFeedbackCall::abi_encode_returns(&(
                clients, scores, tag1s, tag2s, revoked,
            )))
        }
        ReputationRegistryCalls::getClients(c) => {
            let clients = state.clients.get(&c.agentId).cloned().unwrap_or_default();
            Ok(ReputationRegistry::getClientsCall::abi_encode_returns(&(
                clients,
            )))
        }
        ReputationRegistryCalls::getLastIndex(c) => {
            let last = state
                .feedback
                .get(&(c.agentId, c.clientAddress))
                .map(|entries| entries.len() as u64)
                .unwrap_or(0);
            Ok(ReputationRegistry::getLastIndexCall::abi_encode_returns(&(
                last,
            )))
        }
        _ => Err(AdapterError::rejected("not a view")),
    }
}

fn query_validation(
    state: &LedgerState,
    addresses: &ContractAddresses,
    calldata: &[u8],
) -> Result<Vec<u8>, AdapterError> {
    match ValidationRegistryCalls::abi_decode(calldata, true).map_err(bad_calldata)? {
        ValidationRegistryCalls::getIdentityRegistry(_) => Ok(
            ValidationRegistry::getIdentityRegistryCall::abi_encode_returns(&(
                addresses.identity_registry,
            )),
        ),
        ValidationRegistryCalls::getValidationStatus(c) => {
            let v = state
                .validations
                .get(&c.requestHash)
                .ok_or_else(|| AdapterError::rejected("unknown"))?;
            Ok(ValidationRegistry::getValidationStatusCall::abi_encode_returns(&(
                v.validator,
                v.agent_id,
                v.response,
                v.response_hash,
                v.tag,
                v.last_update,
            )))
        }
        ValidationRegistryCalls::getSummary(c) => {
            let responses: Vec<u8> = state
                .agent_validations
                .get(&c.agentId)
                .into_iter()
                .flatten()
                .filter_map(|hash| state.validations.get(hash))
                .filter(|v| {
                    c.validatorAddresses.is_empty() || c.validatorAddresses.contains(&v.validator)
                })
                .filter(|v| c.tag == B256::ZERO || c.tag == v.tag)
                .map(|v| v.response)
                .collect();
            let count = responses.len() as u64;
            let average = if count == 0 {
                0
            } else {
                (responses.iter().map(|&r| r as u64).sum::<u64>() / count) as u8
            };
            Ok(ValidationRegistry::getSummaryCall::abi_encode_returns(&(
                count, average,
            )))
        }
        ValidationRegistryCalls::getAgentValidations(c) => {
            let hashes = state
                .agent_validations
                .get(&c.agentId)
                .cloned()
                .unwrap_or_default();
            Ok(ValidationRegistry::getAgentValidationsCall::abi_encode_returns(&(hashes,)))
        }
        ValidationRegistryCalls::getValidatorRequests(c) => {
            let hashes = state
                .validator_requests
                .get(&c.validatorAddress)
                .cloned()
                .unwrap_or_default();
            Ok(ValidationRegistry::getValidatorRequestsCall::abi_encode_returns(&(hashes,)))
        }
        _ => Err(AdapterError::rejected("not a view")),
    }
}

fn matching_feedback(
    state: &LedgerState,
    agent_id: U256,
    clients: &[Address],
    tag1: B256,
    tag2: B256,
    include_revoked: bool,
) -> Vec<(Address, Feedback)> {
    let all_clients = state.clients.get(&agent_id).cloned().unwrap_or_default();
    let selected = if clients.is_empty() {
        all_clients
    } else {
        clients.to_vec()
    };

    selected
        .into_iter()
        .flat_map(|client| {
            state
                .feedback
                .get(&(agent_id, client))
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(move |f| (client, f))
        })
        .filter(|(_, f)| include_revoked || !f.revoked)
        .filter(|(_, f)| tag1 == B256::ZERO || f.tag1 == tag1)
        .filter(|(_, f)| tag2 == B256::ZERO || f.tag2 == tag2)
        .collect()
}

fn require_owner(state: &LedgerState, agent_id: U256, sender: Address) -> Result<(), AdapterError> {
    match state.owners.get(&agent_id) {
        Some(owner) if *owner == sender => Ok(()),
        Some(_) => Err(AdapterError::rejected("Not authorized")),
        None => Err(AdapterError::rejected("Agent does not exist")),
    }
}

fn log<E: SolEvent>(contract: Address, event: &E) -> EventLog {
    let data = event.encode_log_data();
    EventLog {
        address: contract,
        topics: data.topics().to_vec(),
        data: data.data.clone(),
    }
}

fn bad_calldata(err: alloy::sol_types::Error) -> AdapterError {
    AdapterError::rejected(format!("bad calldata: {err}"))
}

/// One signer's view of a [`Ledger`].
pub struct LedgerAdapter {
    ledger: Ledger,
    signer: Option<PrivateKeySigner>,
}

#[async_trait]
impl BlockchainAdapter for LedgerAdapter {
    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes, AdapterError> {
        self.ledger.query(contract, &calldata).map(Bytes::from)
    }

    async fn send(
        &self,
        contract: Address,
        calldata: Bytes,
    ) -> Result<TransactionOutcome, AdapterError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AdapterError::Signing("no signer".to_string()))?;
        let logs = self.ledger.execute(signer.address(), contract, &calldata)?;
        let block = self.ledger.transaction_count();

        Ok(TransactionOutcome {
            tx_hash: keccak256(&block.to_be_bytes()),
            block_number: Some(block),
            success: true,
            logs,
        })
    }

    async fn sign_typed_data(
        &self,
        payload: &TypedData,
    ) -> Result<PrimitiveSignature, AdapterError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AdapterError::Signing("no signer".to_string()))?;
        let digest = payload
            .eip712_signing_hash()
            .map_err(|e| AdapterError::Signing(e.to_string()))?;
        signer
            .sign_hash_sync(&digest)
            .map_err(|e| AdapterError::Signing(e.to_string()))
    }

    fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn chain_id(&self) -> Result<u64, AdapterError> {
        Ok(CHAIN_ID)
    }
}
