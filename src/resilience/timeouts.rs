//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap file reads and RPC calls with a deadline
//! - Report expiry as a distinct value so callers can map it onto their
//!   own error kind (registry error, account state error, submission timeout)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The wrapped future is dropped on expiry; for a submission that means
//!   the transaction state is unknown, not failed

use std::future::IntoFuture;
use std::time::Duration;

use tokio::time::timeout;

/// A deadline expired. Carries the deadline in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut(pub u64);

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out after {} seconds", self.0)
    }
}

impl std::error::Error for TimedOut {}

/// Run `fut` with a deadline of `duration`.
pub async fn with_timeout<F>(duration: Duration, fut: F) -> Result<F::Output, TimedOut>
where
    F: IntoFuture,
{
    match timeout(duration, fut).await {
        Ok(output) => Ok(output),
        Err(_) => {
            tracing::warn!(timeout_secs = duration.as_secs(), "Operation timed out");
            Err(TimedOut(duration.as_secs()))
        }
    }
}
