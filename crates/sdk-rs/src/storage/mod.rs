//! Content-addressed storage for off-chain documents.
//!
//! Registration files, feedback files and validation documents live off-chain; the
//! registries only keep a URI and a `bytes32` hash. A [`ContentStore`] uploads bytes and
//! hands back a CIDv0, and fetches bytes given a CID or `ipfs://` URI.

mod ipfs;
mod memory;

pub use ipfs::{IpfsHttpStore, IpfsStoreOptions};
pub use memory::MemoryStore;

use async_trait::async_trait;
use erc8004_core::CoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a content store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Request could not be sent or the response body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the node or gateway.
    #[error("{url} returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Content exceeds the configured fetch limit.
    #[error("Content larger than {limit} bytes")]
    TooLarge {
        /// Configured limit.
        limit: usize,
    },

    /// Nothing is stored under this identifier.
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Node response or stored document is not what was expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Identifier is not a valid CIDv0.
    #[error(transparent)]
    Cid(#[from] CoreError),
}

impl StorageError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Http(_) => true,
            StorageError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Http(err.to_string())
    }
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Bare CIDv0.
    pub cid: String,
    /// `ipfs://<cid>`.
    pub uri: String,
    /// Gateway URL, when the store has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Stored size in bytes, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Content-addressed store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `content` and return its CIDv0.
    async fn upload(&self, content: Vec<u8>, name: Option<&str>)
        -> Result<UploadResult, StorageError>;

    /// Retrieve the bytes behind a CID or `ipfs://` URI.
    async fn fetch(&self, cid_or_uri: &str) -> Result<Vec<u8>, StorageError>;
}

/// Serialize `value` as pretty JSON and upload it.
pub async fn upload_json<T>(
    store: &dyn ContentStore,
    value: &T,
    name: Option<&str>,
) -> Result<UploadResult, StorageError>
where
    T: Serialize + ?Sized,
{
    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::InvalidResponse(format!("serialize JSON: {e}")))?;
    store.upload(content, Some(name.unwrap_or("data.json"))).await
}

/// Fetch a document and parse it as JSON.
pub async fn fetch_json<T>(store: &dyn ContentStore, cid_or_uri: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned,
{
    let bytes = store.fetch(cid_or_uri).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::InvalidResponse(format!("{cid_or_uri} is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StorageError::Http("reset".into()).is_retryable());
        assert!(StorageError::Status {
            status: 503,
            url: "http://node".into()
        }
        .is_retryable());
        assert!(!StorageError::Status {
            status: 404,
            url: "http://node".into()
        }
        .is_retryable());
        assert!(!StorageError::NotFound("Qm".into()).is_retryable());
        assert!(!StorageError::TooLarge { limit: 1 }.is_retryable());
    }

    #[test]
    fn test_upload_result_serialization() {
        let result = UploadResult {
            cid: "QmR7GSQM93Cx5eAg6a6yRzNde1FQv7uL6X1o4k7zrJa3LX".into(),
            uri: "ipfs://QmR7GSQM93Cx5eAg6a6yRzNde1FQv7uL6X1o4k7zrJa3LX".into(),
            url: None,
            size: Some(12),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("url").is_none());
        assert_eq!(json["size"], 12);
    }
}
