//! Chain-specific types and error definitions.

use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a submission did not produce an accepted transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionCause {
    /// The endpoint could not be reached or the connection broke.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The node answered with an error (nonce too low, insufficient funds, ...).
    #[error("rejected by node (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The node answered with something that is not a transaction hash.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No answer within the deadline.
    #[error("no response after {0} seconds")]
    Timeout(u64),
}

impl SubmissionCause {
    /// Whether the transaction may have reached the network anyway.
    ///
    /// Callers must treat such a submission as "unknown state": re-read the
    /// nonce before deciding whether to rebuild.
    pub fn is_unknown_state(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Where a submitted transaction stands, as one node sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Known to the node but not in a block yet.
    Pending,
    /// Mined; `success` is false when execution reverted.
    Included { block_number: u64, success: bool },
    /// The node has never seen the hash, or has dropped it.
    NotFound,
}

/// Errors that can occur in any stage of a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Registry lookup missed: contract, chain, deployment or endpoint absent.
    #[error("Registry lookup: {0} not found")]
    NotFound(String),

    /// Registry or batch file could not be read, parsed, or is inconsistent.
    #[error("Registry error: {0}")]
    Registry(String),

    /// Arguments do not match the interface definition.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Malformed address, chain id, nonce or fee parameters.
    #[error("Invalid transaction parameters: {0}")]
    InvalidTransactionParameters(String),

    /// Malformed signing key.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Account state (nonce) query failed.
    #[error("Account state query failed: {0}")]
    AccountState(String),

    /// Transaction status lookup failed.
    #[error("Status query failed: {0}")]
    StatusQuery(String),

    /// The network did not accept the transaction.
    #[error("Submission error: {cause}")]
    Submission { cause: SubmissionCause },
}

impl From<SubmissionCause> for DispatchError {
    fn from(cause: SubmissionCause) -> Self {
        Self::Submission { cause }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
