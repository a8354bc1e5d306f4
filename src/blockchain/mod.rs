//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! (ABI, function, args)
//!     → encoder.rs (ABI call data)
//!     → builder.rs (unsigned tx: to, nonce, fees, chain id)
//!     → signer.rs (secp256k1 signature, EIP-2718 bytes)
//!     → submitter.rs → client.rs (eth_sendRawTransaction with timeout)
//!     → transaction hash
//! ```
//!
//! # Security Constraints
//! - Private keys only from the command line or environment
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - No automatic resubmission

pub mod builder;
pub mod client;
pub mod encoder;
pub mod signer;
pub mod submitter;
pub mod types;

pub use builder::{build_transaction, FeeMarket, FeePolicy, UnsignedTransaction};
pub use client::{AccountStateProvider, ChainClient, RpcChainClient};
pub use encoder::{decode_call, encode_call, encode_call_json};
pub use signer::{SignedTransaction, TxSigner};
pub use submitter::submit;
pub use types::{ChainId, DispatchError, DispatchResult, SubmissionCause, TransactionStatus};
