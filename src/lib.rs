//! Contract call dispatcher.
//!
//! Resolves a contract by logical name and chain id from a metadata
//! registry, encodes a call against its ABI, builds and signs a transaction
//! with the operator's key and submits it to the chain's RPC endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────┐     ┌──────────────────────────────────────────────────────┐
//!   │ registry │────▶│                      pipeline                        │
//!   │ (YAML +  │     │                                                      │
//!   │  ABI)    │     │  encoder ─▶ builder ─▶ signer ─▶ submitter ─▶ client │──▶ RPC node
//!   └──────────┘     │              ▲                                       │
//!                    │              └── nonce (AccountStateProvider)        │
//!                    └──────────────────────────────────────────────────────┘
//!
//!   Cross-cutting: config (TOML) · observability (tracing) · resilience (timeouts)
//! ```

// Core subsystems
pub mod blockchain;
pub mod pipeline;
pub mod registry;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use blockchain::{ChainId, DispatchError, DispatchResult, SubmissionCause, TransactionStatus};
pub use config::DispatchConfig;
pub use pipeline::{CallRequest, DispatchOutcome, Dispatcher};
pub use registry::{AccountBatch, MetadataRegistry};
