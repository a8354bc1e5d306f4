//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::blockchain::builder::FeePolicy;

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Where the contract and chain registries live.
    pub registry: RegistryConfig,

    /// Gas and fee parameters applied to every transaction.
    pub fees: FeeConfig,

    /// JSON-RPC settings.
    pub rpc: RpcConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Registry location configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Root directory of the metadata repository.
    pub metadata_dir: String,

    /// Contracts registry, relative to `metadata_dir`.
    pub contracts_file: String,

    /// Directory holding ABI documents, relative to `metadata_dir`.
    /// `abi_file` entries in the contracts registry resolve against it.
    pub abi_dir: String,

    /// Chains registry, relative to `metadata_dir`.
    pub chains_file: String,

    /// Upper bound for reading all registry files, in seconds.
    pub load_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            metadata_dir: "../../../onchain/contracts-metadata".to_string(),
            contracts_file: "deployment/contracts.yaml".to_string(),
            abi_dir: "deployment".to_string(),
            chains_file: "chains/chains.yaml".to_string(),
            load_timeout_secs: 10,
        }
    }
}

/// Fee configuration.
///
/// `default` applies to every chain without an entry in `chains`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeeConfig {
    /// Fee policy used when a chain has no override.
    pub default: FeePolicy,

    /// Per-chain overrides keyed by decimal chain id.
    pub chains: HashMap<String, FeePolicy>,
}

impl FeeConfig {
    /// Fee policy for a chain: its override if present, else the default.
    pub fn policy_for(&self, chain_id: u64) -> &FeePolicy {
        self.chains
            .get(&chain_id.to_string())
            .unwrap_or(&self.default)
    }
}

/// JSON-RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Timeout for each RPC request in seconds.
    pub request_timeout_secs: u64,

    /// Explicit endpoint keyed by decimal chain id. Takes precedence over
    /// the chain registry's endpoint list.
    pub endpoint_overrides: HashMap<String, String>,
}

impl RpcConfig {
    /// Endpoint override for a chain, if configured.
    pub fn endpoint_override(&self, chain_id: u64) -> Option<&str> {
        self.endpoint_overrides
            .get(&chain_id.to_string())
            .map(String::as_str)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            endpoint_overrides: HashMap::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
