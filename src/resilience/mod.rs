//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (one deadline covering headers and body)
//!     → On expiry before headers: 502 eleven_failed
//!     → On expiry mid-body: stream aborted
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: a synthesis request is not replayed

pub mod timeouts;

pub use timeouts::{before_deadline, deadline_after, DeadlineExceeded};
