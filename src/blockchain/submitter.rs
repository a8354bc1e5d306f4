//! Raw transaction submission.
//!
//! Exactly one attempt per signed transaction. A timeout or broken
//! connection leaves the transaction in an unknown state, surfaced to the
//! caller as such instead of being retried.

use alloy::primitives::TxHash;

use crate::blockchain::client::ChainClient;
use crate::blockchain::signer::SignedTransaction;
use crate::blockchain::types::{DispatchError, DispatchResult};

/// Broadcast `signed` through `client`.
///
/// Returns the hash reported by the node. The transaction is consumed so the
/// same signed bytes cannot be submitted twice through this path.
pub async fn submit(signed: SignedTransaction, client: &dyn ChainClient) -> DispatchResult<TxHash> {
    let local_hash = signed.hash();
    let nonce = signed.unsigned().nonce();

    tracing::info!(
        tx_hash = %local_hash,
        nonce,
        chain_id = signed.unsigned().chain_id().0,
        rpc_url = client.endpoint(),
        "Submitting transaction"
    );

    match client.send_raw_transaction(signed.raw()).await {
        Ok(node_hash) => {
            if node_hash != local_hash {
                tracing::warn!(
                    local_hash = %local_hash,
                    node_hash = %node_hash,
                    "Node reported a different transaction hash"
                );
            }
            tracing::info!(tx_hash = %node_hash, nonce, "Transaction accepted");
            Ok(node_hash)
        }
        Err(cause) => {
            if cause.is_unknown_state() {
                tracing::warn!(
                    tx_hash = %local_hash,
                    nonce,
                    error = %cause,
                    "Submission outcome unknown; re-read the nonce before rebuilding"
                );
            } else {
                tracing::error!(tx_hash = %local_hash, nonce, error = %cause, "Submission failed");
            }
            Err(DispatchError::Submission { cause })
        }
    }
}
