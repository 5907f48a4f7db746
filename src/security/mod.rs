//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming POST /eleven/tts:
//!     → access_control.rs (x-proxy-secret vs configured secret)
//!     → Pass to relay pipeline
//! ```
//!
//! # Design Decisions
//! - Runs before body decoding and before any upstream I/O
//! - Fail closed once a secret is configured
//! - Constant-time comparison of the secret

pub mod access_control;

pub use access_control::{require_proxy_secret, SharedSecretGuard, PROXY_SECRET_HEADER};
