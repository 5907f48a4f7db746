//! Startup announcement.
//!
//! Logs the effective configuration once and flags the two deployments that
//! work but deserve an operator's attention: no shared secret (every caller is
//! admitted) and no upstream key (every synthesis request fails with 500).

use crate::config::RelayConfig;

/// Deployment warnings for `config`, in the order they are logged.
pub fn startup_warnings(config: &RelayConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.security.proxy_secret().is_none() {
        warnings.push("PROXY_SECRET is not set; /eleven/tts accepts any caller");
    }
    if config.upstream.api_key().is_none() {
        warnings.push("ELEVEN_API_KEY is not set; synthesis requests will fail with no_eleven_key");
    }
    warnings
}

pub fn announce(config: &RelayConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream = %config.upstream.base_url,
        request_timeout_ms = config.upstream.request_timeout_ms,
        secret_enforced = config.security.proxy_secret().is_some(),
        "Configuration loaded"
    );
    for warning in startup_warnings(config) {
        tracing::warn!("{}", warning);
    }
}
