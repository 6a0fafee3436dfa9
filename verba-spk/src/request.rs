//! Speak request decoding and utterance tickets

use crate::config::{validate_rate, SpeechConfig};
use crate::error::SpeechError;
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Correlates an utterance with the caller waiting on it.
///
/// An empty ticket marks a fire-and-forget utterance: no callback is sent
/// and no audio focus is held for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh ticket, unique per utterance
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The fire-and-forget ticket
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for Ticket {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Options object as sent by JavaScript, before defaults and validation.
///
/// Only the presence of `text` is checked at this stage; explicit `null`
/// counts as absent for every field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeakOptions {
    pub text: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub rate: Option<f64>,
}

impl SpeakOptions {
    /// Decode the bridge argument array (`[ { text, locale?, rate? } ]`)
    pub fn from_args(args: &Value) -> Result<Self, SpeechError> {
        let options = match args {
            Value::Array(items) => items.first(),
            // A bare options object is accepted as well
            Value::Object(_) => Some(args),
            _ => None,
        };

        match options {
            Some(value @ Value::Object(map)) => {
                if map.get("text").map_or(true, Value::is_null) {
                    return Err(SpeechError::InvalidOptions("text is required".to_string()));
                }
                serde_json::from_value(value.clone())
                    .map_err(|e| SpeechError::InvalidOptions(e.to_string()))
            }
            _ => Err(SpeechError::InvalidOptions(
                "expected an options object".to_string(),
            )),
        }
    }

    /// Apply configured defaults and validate the remaining fields
    pub fn into_request(self, config: &SpeechConfig) -> Result<SpeakRequest, SpeechError> {
        let locale = self
            .locale
            .unwrap_or_else(|| config.default_locale.clone());
        let rate = self.rate.map(|r| r as f32).unwrap_or(config.default_rate);

        SpeakRequest::new(self.text, &locale, rate, config)
    }
}

/// A validated speak request with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakRequest {
    pub text: String,
    pub locale: Locale,
    pub rate: f32,
}

impl SpeakRequest {
    /// Decode and validate in one step
    pub fn from_args(args: &Value, config: &SpeechConfig) -> Result<Self, SpeechError> {
        SpeakOptions::from_args(args)?.into_request(config)
    }

    /// Build a request from typed parts, applying the same validation as the bridge path
    pub fn new(
        text: impl Into<String>,
        locale: &str,
        rate: f32,
        config: &SpeechConfig,
    ) -> Result<Self, SpeechError> {
        let text = text.into();
        if text.len() > config.max_text_length {
            return Err(SpeechError::InvalidOptions(format!(
                "text too long ({} bytes, max {} bytes)",
                text.len(),
                config.max_text_length
            )));
        }
        if text.contains('\0') {
            return Err(SpeechError::InvalidOptions(
                "text contains null bytes".to_string(),
            ));
        }

        validate_rate(rate).map_err(SpeechError::InvalidOptions)?;
        let locale = Locale::parse(locale)?;

        Ok(Self { text, locale, rate })
    }
}
