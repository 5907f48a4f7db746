//! Request spans.
//!
//! Every inbound request gets one span carrying its method, path and
//! `x-request-id`, so log lines from the guard, the pipeline and the stream
//! relay can be correlated.

use axum::{body::Body, http::Request};
use tracing::Span;

use crate::http::request::RequestIdExt;

/// `MakeSpan` function for `TraceLayer`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request.request_id(),
    )
}
