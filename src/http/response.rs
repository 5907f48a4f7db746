//! Caller-facing response rendering.
//!
//! # Responsibilities
//! - Render `RelayError` as `{ok:false, error:<kind>, ...context}`
//! - Build the committed audio response around a streaming body
//! - Turn handler panics into `proxy_error`
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Audio is never cached by intermediaries (`Cache-Control: no-store`)

use std::any::Any;

use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::Stream;
use serde_json::{json, Map, Value};

use crate::relay::error::RelayError;
use crate::relay::stream::StreamError;

impl RelayError {
    /// JSON body carried by the error response.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("ok".into(), Value::Bool(false));
        body.insert("error".into(), Value::from(self.kind()));

        match self {
            RelayError::UpstreamRedirect { status, location } => {
                body.insert("status".into(), json!(status));
                body.insert("location".into(), json!(location));
            }
            RelayError::UpstreamFailed { status, body: text } => {
                body.insert("status".into(), json!(status));
                body.insert("body".into(), json!(text));
            }
            RelayError::BadContentType { content_type, body: text } => {
                body.insert("contentType".into(), json!(content_type));
                body.insert("body".into(), json!(text));
            }
            RelayError::BodyTooLarge { limit } => {
                body.insert("limit".into(), json!(limit));
            }
            RelayError::BadJson(message) | RelayError::Internal(message) => {
                body.insert("message".into(), json!(message));
            }
            RelayError::BadSecret
            | RelayError::EmptyText
            | RelayError::MissingVoiceId
            | RelayError::MissingUpstreamKey
            | RelayError::NotFound => {}
        }

        Value::Object(body)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Commit status 200 with audio headers and stream `body` to the caller.
pub fn audio_response<S>(body: S) -> Response
where
    S: Stream<Item = Result<Bytes, StreamError>> + Send + 'static,
{
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// Panic hook for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    RelayError::Internal(detail).into_response()
}
