//! Configuration for SDK clients.
//!
//! Configuration comes from a TOML file in which `${VAR_NAME}` placeholders are
//! replaced with environment variables before parsing. Optional sections and fields
//! fall back to defaults.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use anyhow::{Context, Result};
use erc8004_core::ContractAddresses;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::adapter::AdapterOptions;
use crate::storage::IpfsStoreOptions;

/// Top-level SDK configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Registry addresses
    pub contracts: ContractsConfig,

    /// Signing key; omit for a read-only client
    #[serde(default)]
    pub signer: SignerConfig,

    /// Chain backend tuning
    #[serde(default)]
    pub adapter: AdapterConfig,

    /// IPFS node and gateway
    #[serde(default)]
    pub ipfs: IpfsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ethereum RPC URL
    pub rpc_url: String,

    /// Chain ID (e.g., 11155111 for Sepolia)
    pub chain_id: u64,
}

/// Registry addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Identity Registry address
    pub identity_registry: Address,

    /// Reputation Registry address (also the EIP-712 verifying contract)
    pub reputation_registry: Address,

    /// Validation Registry address
    pub validation_registry: Address,
}

/// Signer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Hex private key, with or without `0x`
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Chain backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Timeout of a single RPC request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long to wait for a receipt after submitting
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    /// Confirmations before a transaction counts as included
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

/// IPFS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// Node RPC API base URL
    #[serde(default = "default_ipfs_api_url")]
    pub api_url: String,

    /// Gateway prefix used for fetches
    #[serde(default = "default_ipfs_gateway_url")]
    pub gateway_url: String,

    /// Pin uploads on the node
    #[serde(default = "default_ipfs_pin")]
    pub pin: bool,

    /// Largest document accepted by fetch
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: usize,

    /// Per-request timeout
    #[serde(default = "default_ipfs_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_request_timeout_secs() -> u64 {
    30
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_confirmations() -> u64 {
    1
}

fn default_ipfs_api_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_ipfs_gateway_url() -> String {
    "https://ipfs.io/ipfs/".to_string()
}

fn default_ipfs_pin() -> bool {
    true
}

fn default_max_fetch_bytes() -> usize {
    1_000_000
}

fn default_ipfs_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            confirmations: default_confirmations(),
        }
    }
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: default_ipfs_api_url(),
            gateway_url: default_ipfs_gateway_url(),
            pin: default_ipfs_pin(),
            max_fetch_bytes: default_max_fetch_bytes(),
            timeout_secs: default_ipfs_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax.
    /// For example: `private_key = "${AGENT_PRIVATE_KEY}"`
    ///
    /// # Example
    /// ```no_run
    /// # use erc8004_sdk::config::SdkConfig;
    /// let config = SdkConfig::from_file("erc8004.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = expand_env_vars(&contents)?;

        let config: SdkConfig = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string (no environment expansion).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: SdkConfig =
            toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        // Network
        if self.network.rpc_url.is_empty() {
            anyhow::bail!("Network RPC URL cannot be empty");
        }
        if !(self.network.rpc_url.starts_with("http://")
            || self.network.rpc_url.starts_with("https://"))
        {
            anyhow::bail!(
                "Network RPC URL must use http:// or https:// (got {})",
                self.network.rpc_url
            );
        }
        if self.network.chain_id == 0 {
            anyhow::bail!("Chain ID must be non-zero");
        }

        // Contracts
        for (name, address) in [
            ("identity_registry", self.contracts.identity_registry),
            ("reputation_registry", self.contracts.reputation_registry),
            ("validation_registry", self.contracts.validation_registry),
        ] {
            if address == Address::ZERO {
                anyhow::bail!("Contracts {} must be a non-zero address", name);
            }
        }

        // Signer
        if let Some(key) = &self.signer.private_key {
            let key = key.trim_start_matches("0x");
            if key.len() != 64 {
                anyhow::bail!(
                    "Signer private_key must be 64 hex characters (got {})",
                    key.len()
                );
            }
            if !key.chars().all(|c| c.is_ascii_hexdigit()) {
                anyhow::bail!("Signer private_key must be a valid hex string");
            }
        }

        // Adapter
        if self.adapter.request_timeout_secs == 0 {
            anyhow::bail!("Adapter request_timeout_secs must be > 0");
        }
        if self.adapter.receipt_timeout_secs == 0 {
            anyhow::bail!("Adapter receipt_timeout_secs must be > 0");
        }

        // IPFS
        if self.ipfs.api_url.is_empty() || self.ipfs.gateway_url.is_empty() {
            anyhow::bail!("IPFS api_url and gateway_url cannot be empty");
        }
        if self.ipfs.max_fetch_bytes == 0 {
            anyhow::bail!("IPFS max_fetch_bytes must be > 0");
        }
        if self.ipfs.timeout_secs == 0 {
            anyhow::bail!("IPFS timeout_secs must be > 0");
        }

        // Logging
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "Logging format must be 'pretty' or 'json' (got {})",
                self.logging.format
            );
        }

        Ok(())
    }

    /// Registry addresses on the configured chain.
    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            identity_registry: self.contracts.identity_registry,
            reputation_registry: self.contracts.reputation_registry,
            validation_registry: self.contracts.validation_registry,
            chain_id: self.network.chain_id,
        }
    }

    /// Options for the chain backend.
    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            request_timeout: Duration::from_secs(self.adapter.request_timeout_secs),
            receipt_timeout: Duration::from_secs(self.adapter.receipt_timeout_secs),
            confirmations: self.adapter.confirmations,
        }
    }

    /// Options for the IPFS store.
    pub fn ipfs_options(&self) -> IpfsStoreOptions {
        IpfsStoreOptions {
            api_url: self.ipfs.api_url.clone(),
            gateway_url: self.ipfs.gateway_url.clone(),
            pin: self.ipfs.pin,
            max_fetch_bytes: self.ipfs.max_fetch_bytes,
            timeout: Duration::from_secs(self.ipfs.timeout_secs),
        }
    }

    /// Local signer bound to the configured chain, if a key is configured.
    pub fn signer(&self) -> Result<Option<PrivateKeySigner>> {
        let Some(key) = &self.signer.private_key else {
            return Ok(None);
        };

        let signer = PrivateKeySigner::from_str(key.trim_start_matches("0x"))
            .context("Failed to parse signer private key")?;

        Ok(Some(signer.with_chain_id(Some(self.network.chain_id))))
    }
}

/// Replace `${VAR_NAME}` placeholders with environment variable values.
///
/// Placeholders inside TOML comments are left alone; placeholders inside any kind of
/// string (basic, literal, multi-line) are expanded.
///
/// # Errors
/// Returns an error for an unset variable, an empty name, or a placeholder
/// without a closing brace.
fn expand_env_vars(input: &str) -> Result<String> {
    const DELIMITERS: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];

    let mut out = String::with_capacity(input.len());
    let mut open: Option<&str> = None;
    let mut in_comment = false;
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        let offset = input.len() - rest.len();

        if in_comment {
            in_comment = ch != '\n';
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        match open {
            Some(delim) => {
                // Escaped character in a basic string: copy both verbatim
                if ch == '\\' && delim.starts_with('"') {
                    let end = rest
                        .char_indices()
                        .nth(2)
                        .map_or(rest.len(), |(i, _)| i);
                    out.push_str(&rest[..end]);
                    rest = &rest[end..];
                    continue;
                }
                if rest.starts_with(delim) {
                    out.push_str(delim);
                    rest = &rest[delim.len()..];
                    open = None;
                    continue;
                }
            }
            None => {
                if ch == '#' {
                    in_comment = true;
                    out.push(ch);
                    rest = &rest[1..];
                    continue;
                }
                if let Some(delim) = DELIMITERS.into_iter().find(|d| rest.starts_with(d)) {
                    out.push_str(delim);
                    rest = &rest[delim.len()..];
                    open = Some(delim);
                    continue;
                }
            }
        }

        if let Some(after) = rest.strip_prefix("${") {
            let name = match after.find('}') {
                Some(close) if !after[..close].contains('\n') => &after[..close],
                _ => anyhow::bail!(
                    "Unclosed environment variable placeholder at byte {}",
                    offset
                ),
            };
            if name.is_empty() {
                anyhow::bail!("Empty environment variable name at byte {}", offset);
            }

            let value = std::env::var(name).with_context(|| {
                format!(
                    "Environment variable '{}' is not set (referenced at byte {})",
                    name, offset
                )
            })?;
            out.push_str(&value);
            rest = &after[name.len() + 1..];
            continue;
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    Ok(out)
}

/// Install a global `tracing` subscriber for `config`.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format.as_str() {
        "json" => registry.with(fmt::layer().json().with_target(true)).try_init(),
        _ => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
