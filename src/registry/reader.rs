//! Contract and chain metadata lookup.
//!
//! # Responsibilities
//! - Read the contracts registry, every referenced ABI and the chains registry
//! - Reject duplicate deployments and duplicate chain ids at load time
//! - Resolve `(contract name, chain id)` to `(ABI, address)` and a chain id
//!   to its endpoints, never falling back to another chain's data
//!
//! # Data Flow
//! ```text
//! <metadata_dir>/deployment/contracts.yaml ─┐
//! <metadata_dir>/deployment/<abi_file>     ─┼→ MetadataRegistry (immutable)
//! <metadata_dir>/chains/chains.yaml        ─┘      → resolve_contract
//!                                                  → resolve_endpoints / select_endpoint
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::de::DeserializeOwned;
use url::Url;

use crate::blockchain::builder::{parse_address, FeeMarket};
use crate::blockchain::types::{ChainId, DispatchError, DispatchResult};
use crate::config::RegistryConfig;
use crate::registry::types::{ChainRecord, ContractRecord};
use crate::resilience::timeouts::{with_timeout, TimedOut};

#[derive(Debug, Clone)]
struct ContractEntry {
    name: String,
    abi: JsonAbi,
    deployments: Vec<(ChainId, Address)>,
}

#[derive(Debug, Clone)]
struct ChainEntry {
    endpoints: Vec<Url>,
    fee_market: FeeMarket,
}

/// Read-only view over the loaded registries.
#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    contracts: Vec<ContractEntry>,
    chains: BTreeMap<ChainId, ChainEntry>,
}

impl MetadataRegistry {
    /// Load all registry files under `config.metadata_dir`.
    ///
    /// The whole load is bounded by `config.load_timeout_secs`.
    pub async fn load(config: &RegistryConfig) -> DispatchResult<Self> {
        let deadline = Duration::from_secs(config.load_timeout_secs);
        match with_timeout(deadline, Self::load_files(config)).await {
            Ok(result) => result,
            Err(TimedOut(secs)) => Err(DispatchError::Registry(format!(
                "loading registry from {} timed out after {} seconds",
                config.metadata_dir, secs
            ))),
        }
    }

    async fn load_files(config: &RegistryConfig) -> DispatchResult<Self> {
        let root = Path::new(&config.metadata_dir);

        // 1. Contracts registry
        let contracts: Vec<ContractRecord> = read_yaml(&root.join(&config.contracts_file)).await?;

        // 2. ABI documents, one per contract
        let abi_dir = root.join(&config.abi_dir);
        let mut with_abis = Vec::with_capacity(contracts.len());
        for record in contracts {
            let abi = read_abi(&abi_dir.join(&record.abi_file)).await?;
            with_abis.push((record, abi));
        }

        // 3. Chains registry
        let chains: Vec<ChainRecord> = read_yaml(&root.join(&config.chains_file)).await?;

        let registry = Self::from_parts(with_abis, chains)?;

        tracing::info!(
            metadata_dir = %config.metadata_dir,
            contracts = registry.contracts.len(),
            chains = registry.chains.len(),
            "Registry loaded"
        );

        Ok(registry)
    }

    /// Build a registry from in-memory records.
    ///
    /// Applies the same checks as [`MetadataRegistry::load`].
    pub fn from_parts(
        contracts: Vec<(ContractRecord, JsonAbi)>,
        chains: Vec<ChainRecord>,
    ) -> DispatchResult<Self> {
        let mut entries: Vec<ContractEntry> = Vec::with_capacity(contracts.len());

        for (record, abi) in contracts {
            if entries.iter().any(|e| e.name == record.contract_name) {
                return Err(DispatchError::Registry(format!(
                    "contract '{}' is listed more than once",
                    record.contract_name
                )));
            }

            let mut deployments: Vec<(ChainId, Address)> =
                Vec::with_capacity(record.deployment.len());
            for deployment in &record.deployment {
                let chain_id = ChainId(deployment.chain_id);
                if deployments.iter().any(|(id, _)| *id == chain_id) {
                    return Err(DispatchError::Registry(format!(
                        "contract '{}' has more than one deployment on chain {}",
                        record.contract_name, chain_id
                    )));
                }
                let address = parse_address(&deployment.address).map_err(|e| {
                    DispatchError::Registry(format!(
                        "contract '{}' on chain {}: {}",
                        record.contract_name, chain_id, e
                    ))
                })?;
                deployments.push((chain_id, address));
            }

            entries.push(ContractEntry {
                name: record.contract_name,
                abi,
                deployments,
            });
        }

        let mut chain_map = BTreeMap::new();
        for record in chains {
            let chain_id = ChainId(record.id);
            let endpoints = record
                .endpoints
                .iter()
                .map(|raw| {
                    Url::parse(raw).map_err(|e| {
                        DispatchError::Registry(format!(
                            "chain {} has invalid endpoint '{}': {}",
                            chain_id, raw, e
                        ))
                    })
                })
                .collect::<DispatchResult<Vec<_>>>()?;

            let entry = ChainEntry {
                endpoints,
                fee_market: FeeMarket::from_support(record.support_eip1559),
            };
            if chain_map.insert(chain_id, entry).is_some() {
                return Err(DispatchError::Registry(format!(
                    "chain {} is listed more than once",
                    chain_id
                )));
            }
        }

        Ok(Self {
            contracts: entries,
            chains: chain_map,
        })
    }

    /// ABI and deployed address of `name` on `chain_id`.
    pub fn resolve_contract(
        &self,
        name: &str,
        chain_id: ChainId,
    ) -> DispatchResult<(&JsonAbi, Address)> {
        let contract = self
            .contracts
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DispatchError::NotFound(format!("contract '{}'", name)))?;

        contract
            .deployments
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, address)| (&contract.abi, *address))
            .ok_or_else(|| {
                DispatchError::NotFound(format!("deployment of '{}' on chain {}", name, chain_id))
            })
    }

    /// Endpoints of `chain_id` in registry order.
    pub fn resolve_endpoints(&self, chain_id: ChainId) -> DispatchResult<&[Url]> {
        match self.chains.get(&chain_id) {
            Some(chain) if !chain.endpoints.is_empty() => Ok(&chain.endpoints),
            Some(_) => Err(DispatchError::NotFound(format!("endpoint for chain {}", chain_id))),
            None => Err(DispatchError::NotFound(format!("chain {}", chain_id))),
        }
    }

    /// The endpoint used for submissions on `chain_id`.
    ///
    /// An explicit override wins; otherwise the first registry endpoint.
    pub fn select_endpoint(
        &self,
        chain_id: ChainId,
        endpoint_override: Option<&str>,
    ) -> DispatchResult<Url> {
        if let Some(raw) = endpoint_override {
            return Url::parse(raw).map_err(|e| {
                DispatchError::InvalidTransactionParameters(format!(
                    "invalid endpoint override '{}': {}",
                    raw, e
                ))
            });
        }

        let endpoints = self.resolve_endpoints(chain_id)?;
        Ok(endpoints[0].clone())
    }

    /// Transaction family accepted by `chain_id`.
    pub fn fee_market(&self, chain_id: ChainId) -> DispatchResult<FeeMarket> {
        self.chains
            .get(&chain_id)
            .map(|chain| chain.fee_market)
            .ok_or_else(|| DispatchError::NotFound(format!("chain {}", chain_id)))
    }
}

async fn read_text(path: &Path) -> DispatchResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DispatchError::Registry(format!("failed to read {}: {}", path.display(), e)))
}

/// Read and parse a YAML document.
pub(crate) async fn read_yaml<T: DeserializeOwned>(path: &Path) -> DispatchResult<T> {
    let text = read_text(path).await?;
    serde_yaml::from_str(&text)
        .map_err(|e| DispatchError::Registry(format!("failed to parse {}: {}", path.display(), e)))
}

async fn read_abi(path: &Path) -> DispatchResult<JsonAbi> {
    let text = read_text(path).await?;
    serde_json::from_str(&text).map_err(|e| {
        DispatchError::Registry(format!("invalid ABI document {}: {}", path.display(), e))
    })
}
