//! IPFS node HTTP RPC (`/api/v0`) and gateway client.

use async_trait::async_trait;
use erc8004_core::cid::{decode_cid, ipfs_uri, strip_ipfs_prefix};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{ContentStore, StorageError, UploadResult};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io/ipfs/";
const DEFAULT_MAX_FETCH_BYTES: usize = 1_000_000; // 1 MB
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings of an [`IpfsHttpStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsStoreOptions {
    /// Base URL of the node's RPC API.
    pub api_url: String,
    /// Gateway prefix content is fetched from; the CID is appended.
    pub gateway_url: String,
    /// Pin uploads on the node.
    pub pin: bool,
    /// Largest document `fetch` accepts.
    pub max_fetch_bytes: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for IpfsStoreOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            pin: true,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// `/api/v0/add` response line.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

/// Content store talking to an IPFS node and a gateway.
#[derive(Clone)]
pub struct IpfsHttpStore {
    client: Client,
    options: IpfsStoreOptions,
}

impl IpfsHttpStore {
    /// Build a store with explicit settings.
    pub fn new(options: IpfsStoreOptions) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("erc8004-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Http(format!("build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// Gateway URL of a CID.
    pub fn gateway_url(&self, cid: &str) -> String {
        let base = self.options.gateway_url.trim_end_matches('/');
        format!("{}/{}", base, strip_ipfs_prefix(cid))
    }

    fn api_endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.options.api_url.trim_end_matches('/'), path)
    }

    /// Pin an existing CID on the node.
    pub async fn pin(&self, cid: &str) -> Result<(), StorageError> {
        let cid = strip_ipfs_prefix(cid);
        decode_cid(cid)?;

        let url = self.api_endpoint("pin/add");
        let response = self
            .client
            .post(&url)
            .query(&[("arg", cid)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        info!(cid, "Pinned content");
        Ok(())
    }
}

fn parse_add_response(body: &str) -> Result<AddResponse, StorageError> {
    // The node streams one JSON object per line; the last one describes the root
    let line = body
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| StorageError::InvalidResponse("empty add response".to_string()))?;

    let parsed: AddResponse = serde_json::from_str(line)
        .map_err(|e| StorageError::InvalidResponse(format!("add response: {e}")))?;

    // Reject anything that cannot go on-chain
    decode_cid(&parsed.hash)?;
    Ok(parsed)
}

#[async_trait]
impl ContentStore for IpfsHttpStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        name: Option<&str>,
    ) -> Result<UploadResult, StorageError> {
        let url = self.api_endpoint("add");
        let part = Part::bytes(content).file_name(name.unwrap_or("file").to_string());
        let form = Form::new().part("file", part);

        debug!(%url, "Uploading content");
        let response = self
            .client
            .post(&url)
            .query(&[("cid-version", "0"), ("pin", if self.options.pin { "true" } else { "false" })])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let added = parse_add_response(&body)?;
        let size = added.size.as_deref().and_then(|s| s.parse().ok());

        info!(cid = %added.hash, "Uploaded content");
        Ok(UploadResult {
            uri: ipfs_uri(&added.hash),
            url: Some(self.gateway_url(&added.hash)),
            cid: added.hash,
            size,
        })
    }

    async fn fetch(&self, cid_or_uri: &str) -> Result<Vec<u8>, StorageError> {
        let cid = strip_ipfs_prefix(cid_or_uri);
        decode_cid(cid)?;

        let url = self.gateway_url(cid);
        debug!(%url, "Fetching content");
        let mut response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(cid.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let limit = self.options.max_fetch_bytes;
        if let Some(len) = response.content_length() {
            if len as usize > limit {
                return Err(StorageError::TooLarge { limit });
            }
        }

        // Chunked responses carry no length, so the cap is enforced while reading
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(StorageError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}
