//! Inbound synthesis request decoding and validation.
//!
//! Callers are not strict about JSON types (`"0.4"` for a number, `1` for a
//! flag), so the scalar fields are decoded leniently and anything
//! unrecognisable falls back to the configured default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::SynthesisDefaults;
use crate::relay::error::RelayError;

/// Body of `POST /eleven/tts` as the caller sent it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisRequest {
    #[serde(deserialize_with = "lenient::text")]
    pub text: String,
    #[serde(deserialize_with = "lenient::text")]
    pub voice_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub model_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub language_code: String,
    #[serde(deserialize_with = "lenient::number")]
    pub stability: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub similarity_boost: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub style: Option<f64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub use_speaker_boost: Option<bool>,
}

/// Voice tunables in the shape the provider expects.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
}

/// A request that passed validation, with every default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub language_code: String,
    pub voice_settings: VoiceSettings,
}

impl SynthesisRequest {
    /// Decode a raw body. An empty body decodes as an empty request.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, RelayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| RelayError::BadJson(e.to_string()))
    }

    /// Check the required fields and fill in defaults.
    pub fn validate(self, defaults: &SynthesisDefaults) -> Result<Synthesis, RelayError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(RelayError::EmptyText);
        }
        let voice_id = self.voice_id.trim();
        // `.` and `..` would be dropped as dot segments from the upstream path.
        if matches!(voice_id, "" | "." | "..") {
            return Err(RelayError::MissingVoiceId);
        }

        Ok(Synthesis {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            model_id: or_default(&self.model_id, &defaults.model_id),
            language_code: or_default(&self.language_code, &defaults.language_code),
            voice_settings: VoiceSettings {
                stability: self.stability.unwrap_or(defaults.stability),
                similarity_boost: self.similarity_boost.unwrap_or(defaults.similarity_boost),
                style: self.style.unwrap_or(defaults.style),
                use_speaker_boost: self.use_speaker_boost.unwrap_or(defaults.use_speaker_boost),
            },
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        v => v.to_string(),
    }
}

mod lenient {
    use super::*;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let parsed = match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|v| v.is_finite()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}
