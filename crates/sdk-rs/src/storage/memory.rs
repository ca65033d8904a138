//! In-process content store.

use async_trait::async_trait;
use erc8004_core::cid::{decode_cid, encode_digest, ipfs_uri};
use erc8004_core::B256;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ContentStore, StorageError, UploadResult};

/// Content store backed by a map.
///
/// Content is addressed by the sha2-256 multihash of the raw bytes. A real IPFS node
/// hashes the UnixFS DAG node instead, so CIDs from this store only round-trip within
/// the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<B256, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        _name: Option<&str>,
    ) -> Result<UploadResult, StorageError> {
        let digest = B256::from_slice(Sha256::digest(&content).as_slice());
        let cid = encode_digest(digest);
        let size = content.len() as u64;

        self.objects.write().await.insert(digest, content);

        Ok(UploadResult {
            uri: ipfs_uri(&cid),
            cid,
            url: None,
            size: Some(size),
        })
    }

    async fn fetch(&self, cid_or_uri: &str) -> Result<Vec<u8>, StorageError> {
        let digest = decode_cid(cid_or_uri)?;
        self.objects
            .read()
            .await
            .get(&digest)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(cid_or_uri.to_string()))
    }
}
