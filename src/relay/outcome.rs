//! Upstream response gating.
//!
//! The decision is made once from status and headers by [`gate`], before a
//! single body byte is read. Checks run in a fixed order: redirect, status,
//! content type. Only the failing branches touch the body, and only up to a
//! bounded prefix for diagnostics.

use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use futures_util::StreamExt;
use tokio::time::Instant;

use crate::config::UpstreamConfig;
use crate::relay::error::RelayError;
use crate::resilience::before_deadline;

/// Header-only verdict on an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Redirect { location: Option<String> },
    Failed,
    NotAudio { content_type: String },
    Audio { content_type: String },
}

/// Classify a response from its status line and headers alone.
pub fn gate(status: StatusCode, headers: &HeaderMap) -> Verdict {
    if status.is_redirection() {
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return Verdict::Redirect { location };
    }
    if !status.is_success() {
        return Verdict::Failed;
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if content_type.to_ascii_lowercase().contains("audio/") {
        Verdict::Audio { content_type }
    } else {
        Verdict::NotAudio { content_type }
    }
}

/// The pivot value the pipeline branches on.
#[derive(Debug)]
pub enum UpstreamOutcome {
    RedirectBlocked {
        status: u16,
        location: Option<String>,
    },
    UpstreamError {
        status: u16,
        body: String,
    },
    ContentTypeRejected {
        content_type: String,
        body: String,
    },
    /// Nothing has been read from `body` yet.
    Success {
        body: reqwest::Response,
        content_type: String,
    },
}

impl UpstreamOutcome {
    pub async fn from_response(
        response: reqwest::Response,
        limits: &UpstreamConfig,
        deadline: Instant,
    ) -> Self {
        let status = response.status();
        let verdict = gate(status, response.headers());
        match verdict {
            Verdict::Redirect { location } => {
                // Dropped unread; the redirect body never reaches the caller.
                UpstreamOutcome::RedirectBlocked {
                    status: status.as_u16(),
                    location,
                }
            }
            Verdict::Failed => UpstreamOutcome::UpstreamError {
                status: status.as_u16(),
                body: read_prefix(response, limits.error_body_limit, deadline).await,
            },
            Verdict::NotAudio { content_type } => UpstreamOutcome::ContentTypeRejected {
                content_type,
                body: read_prefix(response, limits.content_type_body_limit, deadline).await,
            },
            Verdict::Audio { content_type } => UpstreamOutcome::Success {
                body: response,
                content_type,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpstreamOutcome::RedirectBlocked { .. } => "redirect_blocked",
            UpstreamOutcome::UpstreamError { .. } => "upstream_error",
            UpstreamOutcome::ContentTypeRejected { .. } => "content_type_rejected",
            UpstreamOutcome::Success { .. } => "success",
        }
    }

    /// Split into the streamable response or the caller-facing error.
    pub fn into_result(self) -> Result<reqwest::Response, RelayError> {
        match self {
            UpstreamOutcome::RedirectBlocked { status, location } => {
                Err(RelayError::UpstreamRedirect { status, location })
            }
            UpstreamOutcome::UpstreamError { status, body } => Err(RelayError::UpstreamFailed {
                status: Some(status),
                body,
            }),
            UpstreamOutcome::ContentTypeRejected { content_type, body } => {
                Err(RelayError::BadContentType { content_type, body })
            }
            UpstreamOutcome::Success { body, .. } => Ok(body),
        }
    }
}

/// Read at most `max_chars` characters of the body as text.
///
/// Stops pulling chunks once enough bytes are buffered to cover `max_chars`
/// in the worst UTF-8 case, so an oversized body is never read in full.
/// Read errors and deadline expiry just end the prefix early.
pub async fn read_prefix(response: reqwest::Response, max_chars: usize, deadline: Instant) -> String {
    let byte_budget = max_chars.saturating_mul(4);
    let mut buf: Vec<u8> = Vec::new();
    let mut chunks = Box::pin(response.bytes_stream());

    while buf.len() < byte_budget {
        match before_deadline(deadline, chunks.next()).await {
            Ok(Some(Ok(chunk))) => buf.extend_from_slice(&chunk),
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "Diagnostic body read ended early");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::debug!("Diagnostic body read hit the upstream deadline");
                break;
            }
        }
    }

    truncate_chars(&String::from_utf8_lossy(&buf), max_chars)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
