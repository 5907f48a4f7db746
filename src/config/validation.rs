//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream base address
//! - Validate value ranges (timeouts in (0, 1h], tunables within [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// Longest upstream timeout accepted, in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("upstream.base_url `{value}` is not an absolute http(s) URL")]
    InvalidBaseUrl { value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most 3600000ms (one hour), got {value}")]
    TimeoutTooLong { field: &'static str, value: u64 },

    #[error("synthesis.{field} must be a finite number in [0, 1], got {value}")]
    TunableOutOfRange { field: &'static str, value: f64 },

    #[error("observability.metrics_address `{value}` is not a socket address")]
    InvalidMetricsAddress { value: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl {
            value: config.upstream.base_url.clone(),
        }),
    }

    for (field, value) in [
        ("upstream.connect_timeout_ms", config.upstream.connect_timeout_ms),
        ("upstream.request_timeout_ms", config.upstream.request_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        } else if value > MAX_TIMEOUT_MS {
            errors.push(ValidationError::TimeoutTooLong { field, value });
        }
    }

    for (field, value) in [
        ("upstream.error_body_limit", config.upstream.error_body_limit),
        ("upstream.content_type_body_limit", config.upstream.content_type_body_limit),
        ("security.max_body_bytes", config.security.max_body_bytes),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let synthesis = &config.synthesis;
    for (field, value) in [
        ("stability", synthesis.stability),
        ("similarity_boost", synthesis.similarity_boost),
        ("style", synthesis.style),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::TunableOutOfRange { field, value });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress {
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
