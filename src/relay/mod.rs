//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! POST /eleven/tts (guard already passed)
//!     → request.rs (decode, validate, resolve defaults)
//!     → upstream.rs (build provider call, redirects disabled, send)
//!     → outcome.rs (redirect → status → content-type gate)
//!     → stream.rs (commit 200 audio/mpeg, relay chunks)
//! ```
//!
//! # Design Decisions
//! - Status and headers are fully inspected before any body byte is released
//! - Error bodies are only read up to a bounded diagnostic prefix
//! - After commit, failures terminate the connection instead of changing status

pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod request;
pub mod stream;
pub mod upstream;

pub use error::RelayError;
pub use outcome::UpstreamOutcome;
pub use pipeline::RelayPipeline;
pub use request::{Synthesis, SynthesisRequest};
