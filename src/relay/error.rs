//! Request-scoped failure taxonomy.
//!
//! Every variant maps to a stable `error` discriminator and an HTTP status.
//! Rendering to JSON lives in `http::response`.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing or mismatched proxy secret")]
    BadSecret,

    #[error("request body is not valid JSON: {0}")]
    BadJson(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("text is empty")]
    EmptyText,

    #[error("voiceId is empty")]
    MissingVoiceId,

    #[error("upstream API key is not configured")]
    MissingUpstreamKey,

    #[error("upstream attempted a redirect ({status}) to {location:?}")]
    UpstreamRedirect {
        status: u16,
        location: Option<String>,
    },

    /// `status` is `None` when no response headers arrived before the deadline.
    #[error("upstream request failed with status {status:?}")]
    UpstreamFailed { status: Option<u16>, body: String },

    #[error("upstream returned non-audio content type `{content_type}`")]
    BadContentType { content_type: String, body: String },

    #[error("route not found")]
    NotFound,

    #[error("internal relay failure: {0}")]
    Internal(String),
}

impl RelayError {
    /// Stable discriminator written to the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BadSecret => "bad_secret",
            RelayError::BadJson(_) => "bad_json",
            RelayError::BodyTooLarge { .. } => "body_too_large",
            RelayError::EmptyText => "empty_text",
            RelayError::MissingVoiceId => "no_voiceId",
            RelayError::MissingUpstreamKey => "no_eleven_key",
            RelayError::UpstreamRedirect { .. } => "eleven_redirect",
            RelayError::UpstreamFailed { .. } => "eleven_failed",
            RelayError::BadContentType { .. } => "bad_content_type",
            RelayError::NotFound => "not_found",
            RelayError::Internal(_) => "proxy_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::BadSecret => StatusCode::UNAUTHORIZED,
            RelayError::BadJson(_) | RelayError::EmptyText | RelayError::MissingVoiceId => {
                StatusCode::BAD_REQUEST
            }
            RelayError::MissingUpstreamKey | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::UpstreamRedirect { .. }
            | RelayError::UpstreamFailed { .. }
            | RelayError::BadContentType { .. } => StatusCode::BAD_GATEWAY,
            RelayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}
