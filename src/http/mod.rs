//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, routes)
//!     → request.rs (x-request-id set & propagated)
//!     → security guard (POST /eleven/tts only)
//!     → relay pipeline
//!     → response.rs (JSON error or streamed audio)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, RelayServer};
