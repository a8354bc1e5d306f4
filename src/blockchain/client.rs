//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Define the `AccountStateProvider` (nonce lookup) and `ChainClient`
//!   (raw submission) capabilities the pipeline depends on
//! - Implement both over one JSON-RPC endpoint with alloy
//! - Bound every request with a timeout and classify node errors
//! - Report the status of a submitted transaction with one bounded lookup

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use url::Url;

use crate::blockchain::types::{
    ChainId, DispatchError, DispatchResult, SubmissionCause, TransactionStatus,
};
use crate::resilience::timeouts::{with_timeout, TimedOut};

/// Account state queries needed before building a transaction.
#[async_trait]
pub trait AccountStateProvider: Send + Sync {
    /// Next unused nonce for `address`, counting pending transactions.
    async fn next_nonce(&self, address: Address) -> DispatchResult<u64>;
}

/// Raw transaction submission.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Endpoint the client talks to, for logging.
    fn endpoint(&self) -> &str;

    /// Broadcast EIP-2718 encoded bytes and return the hash the node reports.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, SubmissionCause>;
}

/// JSON-RPC client bound to a single endpoint.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    endpoint: Url,
    chain_id: ChainId,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcChainClient {
    /// Create a client for `endpoint`.
    ///
    /// No connection is made until the first request.
    pub fn new(endpoint: Url, chain_id: ChainId, timeout_duration: Duration) -> Self {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(endpoint.clone());

        tracing::info!(
            rpc_url = %endpoint,
            chain_id = chain_id.0,
            timeout_secs = timeout_duration.as_secs(),
            "Blockchain client initialized"
        );

        Self {
            provider: Arc::new(provider) as Arc<dyn Provider + Send + Sync>,
            endpoint,
            chain_id,
            timeout_duration,
        }
    }

    /// Verify the endpoint serves the configured chain.
    pub async fn verify_chain_id(&self) -> DispatchResult<()> {
        let actual = with_timeout(self.timeout_duration, self.provider.get_chain_id())
            .await
            .map_err(|TimedOut(secs)| {
                DispatchError::AccountState(format!(
                    "chain id query timed out after {} seconds",
                    secs
                ))
            })?
            .map_err(|e| DispatchError::AccountState(format!("chain id query failed: {}", e)))?;

        if actual != self.chain_id.0 {
            return Err(DispatchError::InvalidTransactionParameters(format!(
                "endpoint {} serves chain {}, expected {}",
                self.endpoint, actual, self.chain_id
            )));
        }
        Ok(())
    }

    /// Chain this client was created for.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Look up where `hash` stands.
    ///
    /// A receipt means the transaction was mined. Without one, a known
    /// transaction is pending and an unknown one is not found. Each request
    /// is bounded by the client timeout; nothing waits for inclusion.
    pub async fn transaction_status(&self, hash: TxHash) -> DispatchResult<TransactionStatus> {
        let status_error =
            |what: String| DispatchError::StatusQuery(format!("status of {}: {}", hash, what));

        // 1. Mined transactions have a receipt
        let fut = self.provider.get_transaction_receipt(hash);
        let receipt = with_timeout(self.timeout_duration, fut)
            .await
            .map_err(|TimedOut(secs)| status_error(format!("timed out after {} seconds", secs)))?
            .map_err(|e| status_error(format!("receipt query failed: {}", e)))?;

        if let Some(receipt) = receipt {
            let status = TransactionStatus::Included {
                block_number: receipt.block_number.unwrap_or_default(),
                success: receipt.status(),
            };
            tracing::debug!(tx_hash = %hash, status = ?status, "Transaction status");
            return Ok(status);
        }

        // 2. Otherwise ask whether the node knows the transaction at all
        let fut = self
            .provider
            .client()
            .request::<_, Option<serde_json::Value>>("eth_getTransactionByHash", (hash,));
        let known = with_timeout(self.timeout_duration, fut)
            .await
            .map_err(|TimedOut(secs)| status_error(format!("timed out after {} seconds", secs)))?
            .map_err(|e| status_error(format!("transaction query failed: {}", e)))?;

        let status = match known {
            Some(tx) if !tx.is_null() => TransactionStatus::Pending,
            _ => TransactionStatus::NotFound,
        };
        tracing::debug!(tx_hash = %hash, status = ?status, "Transaction status");
        Ok(status)
    }
}

#[async_trait]
impl AccountStateProvider for RpcChainClient {
    async fn next_nonce(&self, address: Address) -> DispatchResult<u64> {
        let fut = self.provider.get_transaction_count(address).pending();
        match with_timeout(self.timeout_duration, fut).await {
            Ok(Ok(nonce)) => Ok(nonce),
            Ok(Err(e)) => Err(DispatchError::AccountState(format!(
                "nonce query for {} failed: {}",
                address, e
            ))),
            Err(TimedOut(secs)) => Err(DispatchError::AccountState(format!(
                "nonce query for {} timed out after {} seconds",
                address, secs
            ))),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, SubmissionCause> {
        let fut = self.provider.send_raw_transaction(raw);
        match with_timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(classify_rpc_error(e)),
            Err(TimedOut(secs)) => Err(SubmissionCause::Timeout(secs)),
        }
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.endpoint.as_str())
            .field("chain_id", &self.chain_id.0)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

/// Map an alloy RPC error onto a submission cause.
pub fn classify_rpc_error(err: RpcError<TransportErrorKind>) -> SubmissionCause {
    match err {
        RpcError::ErrorResp(payload) => SubmissionCause::Rejected {
            code: payload.code,
            message: payload.message.to_string(),
        },
        RpcError::NullResp => SubmissionCause::MalformedResponse("null response".to_string()),
        RpcError::DeserError { err, text } => {
            SubmissionCause::MalformedResponse(format!("{} in response '{}'", err, text))
        }
        other => SubmissionCause::Connection(other.to_string()),
    }
}
