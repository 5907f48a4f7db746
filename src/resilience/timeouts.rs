//! Timeout enforcement.
//!
//! # Responsibilities
//! - Derive one deadline per upstream exchange
//! - Bound every await on the upstream (headers, diagnostic prefix, body chunks)
//!   by that same deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A deadline, not a per-chunk idle timeout: slow-drip bodies still terminate
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("upstream deadline exceeded")]
pub struct DeadlineExceeded;

/// Deadline for an exchange starting now.
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

/// Await `fut` unless `deadline` passes first.
pub async fn before_deadline<F>(deadline: Instant, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| DeadlineExceeded)
}

/// Milliseconds left before `deadline`, saturating at zero.
pub fn remaining_ms(deadline: Instant) -> u128 {
    deadline.saturating_duration_since(Instant::now()).as_millis()
}
