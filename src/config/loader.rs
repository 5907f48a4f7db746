//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidPort(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidPort(v) => write!(f, "PORT `{}` is not a valid port number", v),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let config = match path {
        Some(path) => parse_file(path)?,
        None => RelayConfig::default(),
    };
    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay `PORT`, `ELEVEN_BASE_URL`, `ELEVEN_API_KEY` and `PROXY_SECRET`.
///
/// Blank values are ignored so an exported-but-empty variable never clobbers the file.
pub fn apply_env_overrides<F>(mut config: RelayConfig, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(port) = get("PORT") {
        config.listener.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
    }
    if let Some(base_url) = get("ELEVEN_BASE_URL") {
        config.upstream.base_url = base_url;
    }
    if let Some(key) = get("ELEVEN_API_KEY") {
        config.upstream.api_key = Some(key);
    }
    if let Some(secret) = get("PROXY_SECRET") {
        config.security.proxy_secret = Some(secret);
    }

    Ok(config)
}
