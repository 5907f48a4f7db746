//! Access Control Middleware.
//! Enforces the caller-facing shared secret.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::relay::error::RelayError;

pub const PROXY_SECRET_HEADER: &str = "x-proxy-secret";

/// Admission decision for the shared secret.
#[derive(Clone)]
pub struct SharedSecretGuard {
    secret: Option<Arc<str>>,
}

impl SharedSecretGuard {
    /// A guard for `secret`; `None` (or blank) admits everyone.
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Arc::from);
        Self { secret }
    }

    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    /// Compare the trimmed `supplied` credential against the configured secret.
    pub fn admit(&self, supplied: Option<&str>) -> Result<(), RelayError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        let supplied = supplied.map(str::trim).unwrap_or_default();
        if bool::from(supplied.as_bytes().ct_eq(secret.as_bytes())) {
            Ok(())
        } else {
            Err(RelayError::BadSecret)
        }
    }
}

pub async fn require_proxy_secret(
    State(guard): State<SharedSecretGuard>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // A non-UTF-8 value reads as empty, which never matches a configured secret.
    let supplied = req
        .headers()
        .get(PROXY_SECRET_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    match guard.admit(supplied) {
        Ok(()) => next.run(req).await,
        Err(error) => {
            tracing::warn!(request_id = %req.request_id(), "Rejected request with bad proxy secret");
            metrics::record_request(error.kind(), error.status_code().as_u16(), Instant::now());
            error.into_response()
        }
    }
}
