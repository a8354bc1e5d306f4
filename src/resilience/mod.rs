//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Registry file read / nonce query / raw submission:
//!     → timeouts.rs (enforce deadline)
//!     → On expiry: caller maps TimedOut onto its own error kind
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: a resubmitted transaction could be
//!   double-applied if the first attempt was accepted
pub mod timeouts;
