//! Post-commit byte relay.
//!
//! The upstream body is adapted into a stream that hyper polls only when the
//! caller connection can take more bytes, so reads are paced by the caller's
//! write side. Dropping the stream (caller went away) drops the upstream
//! response and closes that connection. Any error yielded here makes hyper
//! terminate the caller connection; headers are already on the wire.

use axum::body::Bytes;
use futures_util::{stream, Stream, StreamExt};
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::timeouts::remaining_ms;
use crate::resilience::{before_deadline, DeadlineExceeded};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("upstream body failed mid-stream: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream body exceeded the request deadline")]
    Deadline(#[from] DeadlineExceeded),
}

impl StreamError {
    fn reason(&self) -> &'static str {
        match self {
            StreamError::Upstream(_) => "upstream_error",
            StreamError::Deadline(_) => "deadline",
        }
    }
}

struct RelayState<S> {
    chunks: S,
    deadline: Instant,
    relayed: u64,
    request_id: String,
}

/// Relay every chunk of `chunks` in order until it ends, fails, or the deadline passes.
///
/// Ends the caller stream only after upstream completion; after an error no
/// further chunk is pulled.
pub fn relay_chunks<S>(
    chunks: S,
    deadline: Instant,
    request_id: String,
) -> impl Stream<Item = Result<Bytes, StreamError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = RelayState {
        chunks: Box::pin(chunks),
        deadline,
        relayed: 0,
        request_id,
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        let next = match before_deadline(state.deadline, state.chunks.next()).await {
            Ok(next) => next,
            Err(e) => return Some((Err(abort(&state, e.into())), None)),
        };

        match next {
            Some(Ok(chunk)) => {
                state.relayed += chunk.len() as u64;
                metrics::record_stream_bytes(chunk.len() as u64);
                Some((Ok(chunk), Some(state)))
            }
            Some(Err(e)) => Some((Err(abort(&state, e.into())), None)),
            None => {
                tracing::debug!(
                    request_id = %state.request_id,
                    bytes = state.relayed,
                    "Audio stream complete"
                );
                None
            }
        }
    })
}

/// Relay the body of an already-gated upstream response.
pub fn relay_body(
    upstream: reqwest::Response,
    deadline: Instant,
    request_id: String,
) -> impl Stream<Item = Result<Bytes, StreamError>> + Send + 'static {
    relay_chunks(upstream.bytes_stream(), deadline, request_id)
}

fn abort<S>(state: &RelayState<S>, error: StreamError) -> StreamError {
    tracing::warn!(
        request_id = %state.request_id,
        bytes = state.relayed,
        remaining_ms = remaining_ms(state.deadline) as u64,
        error = %error,
        "Audio stream aborted after headers were sent"
    );
    metrics::record_stream_abort(error.reason());
    error
}
