//! The relay pipeline: validate, call upstream, gate, stream.

use std::sync::Arc;
use std::time::Instant;

use axum::response::{IntoResponse, Response};

use crate::config::RelayConfig;
use crate::http::response::audio_response;
use crate::observability::metrics;
use crate::relay::error::RelayError;
use crate::relay::outcome::UpstreamOutcome;
use crate::relay::request::SynthesisRequest;
use crate::relay::stream::relay_body;
use crate::relay::upstream::{ClientInitError, SendError, UpstreamClient};
use crate::resilience::deadline_after;

pub struct RelayPipeline {
    config: Arc<RelayConfig>,
    upstream: UpstreamClient,
}

impl RelayPipeline {
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, ClientInitError> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        Ok(Self { config, upstream })
    }

    /// Run one request through the pipeline and record its outcome.
    pub async fn handle(&self, request: SynthesisRequest, request_id: &str) -> Response {
        let start = Instant::now();
        match self.relay(request, request_id).await {
            Ok(response) => {
                metrics::record_request("success", 200, start);
                response
            }
            Err(error) => {
                log_failure(&error, request_id);
                metrics::record_request(error.kind(), error.status_code().as_u16(), start);
                error.into_response()
            }
        }
    }

    /// Produce the committed audio response, or the error to send instead.
    ///
    /// Nothing is written to the caller before this returns, so every error
    /// here can still become a JSON body.
    pub async fn relay(
        &self,
        request: SynthesisRequest,
        request_id: &str,
    ) -> Result<Response, RelayError> {
        let synthesis = request.validate(&self.config.synthesis)?;
        let api_key = self
            .config
            .upstream
            .api_key()
            .ok_or(RelayError::MissingUpstreamKey)?;

        tracing::info!(
            request_id = %request_id,
            voice_id = %synthesis.voice_id,
            model_id = %synthesis.model_id,
            text_chars = synthesis.text.chars().count(),
            "Relaying synthesis request"
        );

        let upstream_config = &self.config.upstream;
        let deadline = deadline_after(upstream_config.request_timeout());

        let response = self
            .upstream
            .send(&synthesis, api_key, deadline)
            .await
            .map_err(|e| match e {
                SendError::Timeout(_) => RelayError::UpstreamFailed {
                    status: None,
                    body: format!(
                        "upstream did not respond within {}ms",
                        upstream_config.request_timeout_ms
                    ),
                },
                SendError::Transport(e) => RelayError::Internal(e.to_string()),
            })?;

        let outcome = UpstreamOutcome::from_response(response, upstream_config, deadline).await;
        tracing::debug!(request_id = %request_id, outcome = outcome.label(), "Upstream response gated");

        let body = outcome.into_result()?;
        Ok(audio_response(relay_body(body, deadline, request_id.to_string())))
    }
}

fn log_failure(error: &RelayError, request_id: &str) {
    match error {
        RelayError::Internal(_) | RelayError::MissingUpstreamKey => {
            tracing::error!(request_id = %request_id, kind = error.kind(), error = %error, "Relay failed");
        }
        RelayError::UpstreamRedirect { .. }
        | RelayError::UpstreamFailed { .. }
        | RelayError::BadContentType { .. } => {
            tracing::warn!(request_id = %request_id, kind = error.kind(), error = %error, "Upstream rejected");
        }
        _ => {
            tracing::debug!(request_id = %request_id, kind = error.kind(), "Request rejected");
        }
    }
}
