//! Upstream synthesis client.
//!
//! Builds the single outbound `POST {base}/v1/text-to-speech/{voice}/stream`
//! call. Redirect following is disabled on the underlying client: a 3xx is
//! handed back to the gate as-is and never chased to another host.

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

use crate::config::UpstreamConfig;
use crate::relay::request::{Synthesis, VoiceSettings};
use crate::resilience::{before_deadline, DeadlineExceeded};

pub const OUTPUT_FORMAT: &str = "mp3_44100_128";
pub const API_KEY_HEADER: &str = "xi-api-key";

#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("invalid upstream base url `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("failed to build upstream HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why the upstream exchange produced no response headers.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// JSON body sent to the provider.
#[derive(Debug, Serialize)]
pub struct UpstreamBody<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub language_code: &'a str,
    pub voice_settings: VoiceSettings,
}

impl<'a> From<&'a Synthesis> for UpstreamBody<'a> {
    fn from(s: &'a Synthesis) -> Self {
        Self {
            text: &s.text,
            model_id: &s.model_id,
            language_code: &s.language_code,
            voice_settings: s.voice_settings,
        }
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientInitError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ClientInitError::BaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientInitError::BaseUrl {
                url: config.base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { http, base_url })
    }

    /// `{base}/v1/text-to-speech/{voice}/stream?output_format=...`, voice id percent-encoded.
    pub fn stream_url(&self, voice_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "text-to-speech", voice_id, "stream"]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("output_format", OUTPUT_FORMAT);
        url
    }

    pub fn build_request(&self, synthesis: &Synthesis, api_key: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.stream_url(&synthesis.voice_id))
            .header(API_KEY_HEADER, api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "audio/mpeg")
            .json(&UpstreamBody::from(synthesis))
    }

    /// Send the call and wait for response headers, bounded by `deadline`.
    pub async fn send(
        &self,
        synthesis: &Synthesis,
        api_key: &str,
        deadline: Instant,
    ) -> Result<reqwest::Response, SendError> {
        let request = self.build_request(synthesis, api_key);
        let response = before_deadline(deadline, request.send()).await??;
        Ok(response)
    }
}
