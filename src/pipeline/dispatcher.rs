//! Resolve → encode → build → sign → submit for one chain.
//!
//! # Responsibilities
//! - Drive one contract call through every stage, failing fast
//! - Read the nonce immediately before building
//! - Serialize nonce acquisition through submission for this sender
//! - Never reuse a nonce the network may already hold, even when the node
//!   reports a stale pending count

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::blockchain::builder::build_transaction;
use crate::blockchain::client::{AccountStateProvider, ChainClient, RpcChainClient};
use crate::blockchain::encoder::encode_call_json;
use crate::blockchain::signer::TxSigner;
use crate::blockchain::submitter::submit;
use crate::blockchain::types::{ChainId, DispatchError, DispatchResult};
use crate::config::DispatchConfig;
use crate::config::FeeConfig;
use crate::registry::{AccountBatch, MetadataRegistry};

/// A contract call to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Logical contract name in the registry.
    pub contract: String,
    pub function: String,
    /// Call arguments, coerced against the function's declared inputs.
    pub args: Vec<Value>,
}

/// Result of dispatching an account batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The transaction was accepted for propagation.
    Submitted(TxHash),
    /// The batch had no accounts; nothing was built or sent.
    Empty,
}

/// Sequential dispatcher bound to one chain and one signing key.
pub struct Dispatcher {
    chain_id: ChainId,
    registry: Arc<MetadataRegistry>,
    signer: TxSigner,
    fees: FeeConfig,
    accounts: Arc<dyn AccountStateProvider>,
    client: Arc<dyn ChainClient>,
    /// Next nonce after the last one the network may hold.
    ///
    /// Held from nonce read until the node answers.
    nonce_lock: Mutex<Option<u64>>,
}

impl Dispatcher {
    pub fn new(
        chain_id: ChainId,
        registry: Arc<MetadataRegistry>,
        signer: TxSigner,
        fees: FeeConfig,
        accounts: Arc<dyn AccountStateProvider>,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            chain_id,
            registry,
            signer,
            fees,
            accounts,
            client,
            nonce_lock: Mutex::new(None),
        }
    }

    /// Create a dispatcher talking JSON-RPC to the chain's selected endpoint.
    ///
    /// The endpoint is the configured override for `chain_id` if any,
    /// else the first endpoint in the chain registry. The endpoint must
    /// report `chain_id` before anything is signed for it.
    pub async fn connect(
        chain_id: ChainId,
        registry: Arc<MetadataRegistry>,
        signer: TxSigner,
        config: &DispatchConfig,
    ) -> DispatchResult<Self> {
        let override_url = config.rpc.endpoint_override(chain_id.0);
        let endpoint = registry.select_endpoint(chain_id, override_url)?;
        let timeout = Duration::from_secs(config.rpc.request_timeout_secs);
        let client = Arc::new(RpcChainClient::new(endpoint, chain_id, timeout));
        client.verify_chain_id().await?;

        Ok(Self::new(
            chain_id,
            registry,
            signer,
            config.fees.clone(),
            client.clone(),
            client,
        ))
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Run one contract call through the whole pipeline.
    pub async fn dispatch(&self, request: CallRequest) -> DispatchResult<TxHash> {
        let span = tracing::info_span!(
            "dispatch",
            chain_id = self.chain_id.0,
            contract = %request.contract,
            function = %request.function
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: CallRequest) -> DispatchResult<TxHash> {
        // 1. Resolve contract and chain
        let (abi, to) = self.registry.resolve_contract(&request.contract, self.chain_id)?;
        let fee_market = self.registry.fee_market(self.chain_id)?;

        // 2. Encode call data
        let payload = encode_call_json(abi, &request.function, &request.args)?;

        let fee_policy = self.fees.policy_for(self.chain_id.0);
        let from = self.signer.address();

        // 3. Nonce through submission under the lock
        let mut next_local = self.nonce_lock.lock().await;

        let fetched = self.accounts.next_nonce(from).await?;
        let nonce = match *next_local {
            Some(local) if local > fetched => {
                tracing::debug!(fetched, local, "Node nonce is behind the last submission");
                local
            }
            _ => fetched,
        };
        tracing::debug!(from = %from, nonce, "Nonce acquired");

        // 4. Build
        let unsigned = build_transaction(
            from,
            to,
            payload,
            self.chain_id,
            nonce,
            fee_policy,
            fee_market,
        )?;

        // 5. Sign
        let signed = self.signer.sign(unsigned)?;

        // 6. Submit
        let result = submit(signed, self.client.as_ref()).await;

        // A rejected nonce stays free; an unanswered one may be taken
        match &result {
            Ok(_) => *next_local = nonce.checked_add(1),
            Err(DispatchError::Submission { cause }) if cause.is_unknown_state() => {
                *next_local = nonce.checked_add(1)
            }
            Err(_) => {}
        }

        result
    }

    /// Submit `function(accounts, true)` on `contract` for a batch.
    ///
    /// An empty batch returns [`DispatchOutcome::Empty`] without any
    /// network access.
    pub async fn dispatch_account_batch(
        &self,
        contract: &str,
        function: &str,
        batch: AccountBatch,
    ) -> DispatchResult<DispatchOutcome> {
        if batch.chain_id() != self.chain_id {
            return Err(DispatchError::InvalidTransactionParameters(format!(
                "batch for chain {} given to dispatcher for chain {}",
                batch.chain_id(),
                self.chain_id
            )));
        }

        if batch.is_empty() {
            tracing::info!(
                chain_id = self.chain_id.0,
                "Account batch is empty, nothing to submit"
            );
            return Ok(DispatchOutcome::Empty);
        }

        tracing::info!(
            chain_id = self.chain_id.0,
            accounts = batch.len(),
            contract,
            function,
            "Dispatching account batch"
        );

        let request = CallRequest {
            contract: contract.to_string(),
            function: function.to_string(),
            args: vec![Value::Array(batch.into_accounts()), Value::Bool(true)],
        };

        self.dispatch(request).await.map(DispatchOutcome::Submitted)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain_id", &self.chain_id.0)
            .field("sender", &self.signer.address())
            .field("rpc_url", &self.client.endpoint())
            .finish()
    }
}
