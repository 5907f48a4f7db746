//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Synthesis provider settings.
    pub upstream: UpstreamConfig,

    /// Caller-facing shared secret and request limits.
    pub security: SecurityConfig,

    /// Defaults applied to omitted synthesis tunables.
    pub synthesis: SynthesisDefaults,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream synthesis provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider base address, without the `/v1/...` path.
    pub base_url: String,

    /// Provider credential sent as `xi-api-key`.
    pub api_key: Option<String>,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Deadline for the whole upstream exchange, headers and body, in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum characters of a non-2xx body echoed back for diagnostics.
    pub error_body_limit: usize,

    /// Maximum characters of a non-audio body echoed back for diagnostics.
    pub content_type_body_limit: usize,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The credential, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: None,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 120_000,
            error_body_limit: 400,
            content_type_body_limit: 250,
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redacted(self.api_key()))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("error_body_limit", &self.error_body_limit)
            .field("content_type_body_limit", &self.content_type_body_limit)
            .finish()
    }
}

/// Security configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared secret callers must present in `x-proxy-secret`.
    /// When unset every caller is admitted.
    pub proxy_secret: Option<String>,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl SecurityConfig {
    /// The shared secret, if one is configured and non-blank.
    pub fn proxy_secret(&self) -> Option<&str> {
        non_blank(self.proxy_secret.as_deref())
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            proxy_secret: None,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("proxy_secret", &redacted(self.proxy_secret()))
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Synthesis defaults used when the caller omits a tunable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisDefaults {
    pub model_id: String,
    pub language_code: String,
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
}

impl Default for SynthesisDefaults {
    fn default() -> Self {
        Self {
            model_id: "eleven_multilingual_v2".to_string(),
            language_code: "en".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn redacted(value: Option<&str>) -> Option<&'static str> {
    value.map(|_| "<redacted>")
}
