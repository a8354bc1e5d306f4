//! Dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! CallRequest / AccountBatch
//!     → registry (ABI + address, fee market)
//!     → encoder (call data)
//!     → AccountStateProvider (pending nonce)   ┐
//!     → builder → signer                       │ nonce lock held
//!     → submitter → ChainClient                ┘
//!     → TxHash | DispatchError (stage + cause)
//! ```
//!
//! # Design Decisions
//! - Fail fast: an error in any stage aborts the rest
//! - Nothing is retried; a retry is a new dispatch with a fresh nonce

pub mod dispatcher;

pub use dispatcher::{CallRequest, DispatchOutcome, Dispatcher};
