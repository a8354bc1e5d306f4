//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (chain_id, contract, nonce, tx_hash)
//!
//! Consumers:
//!     → logging.rs subscriber → stderr (text or JSON lines)
//! ```
//!
//! # Design Decisions
//! - stdout is reserved for the command result (the transaction hash)
//! - `RUST_LOG` overrides the configured level
//! - Keys and signed payloads are never logged

pub mod logging;

pub use logging::init_logging;
