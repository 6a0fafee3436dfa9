//! Configuration for the speech adapter

use crate::error::SpeechError;
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::path::Path;
use verba_core::config::{env_var, parse_config, read_config_file};

/// Speech adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale used when a request omits one (and for the warm-up utterance)
    pub default_locale: String,

    /// Rate used when a request omits one (1.0 = normal speed)
    pub default_rate: f32,

    /// Longest accepted text, in bytes
    pub max_text_length: usize,

    /// Speak an empty utterance once the engine is ready so it loads its resources
    pub warm_up: bool,

    /// Resolve callers whose utterance was stopped with `ERR_INTERRUPTED`.
    /// When false, stopped utterances release focus and leave the caller pending.
    pub report_interruptions: bool,

    /// Which audio focus API generation to use
    pub focus_api: FocusApiPreference,

    /// Usage attribute attached to focus requests
    pub focus_usage: AudioUsage,

    /// Treat a delayed focus grant as held instead of waiting for it
    pub accept_delayed_focus: bool,
}

/// Audio focus API selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusApiPreference {
    /// Use whatever the arbiter reports as its newest API
    Auto,
    /// Focus-request objects with audio attributes
    Request,
    /// Legacy stream + change-listener requests
    Stream,
}

/// Audio usage attribute for focus requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioUsage {
    Game,
    Media,
    Assistant,
    AccessibilitySpeech,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_locale: "en-US".to_string(),
            default_rate: 1.0,
            max_text_length: 4000,
            warm_up: true,
            report_interruptions: true,
            focus_api: FocusApiPreference::Auto,
            focus_usage: AudioUsage::Game,
            accept_delayed_focus: true,
        }
    }
}

impl SpeechConfig {
    /// Load configuration from a JSON, TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SpeechError> {
        let config: Self = read_config_file(path)?;
        config.validate().map_err(SpeechError::Config)?;
        Ok(config)
    }

    /// Load configuration from a JSON, TOML or YAML string
    pub fn from_str(content: &str) -> Result<Self, SpeechError> {
        let config: Self = parse_config(content)?;
        config.validate().map_err(SpeechError::Config)?;
        Ok(config)
    }

    /// Overlay `VERBA_*` environment variables onto this configuration
    pub fn with_env(mut self) -> Self {
        if let Some(locale) = env_var::<String>("VERBA_DEFAULT_LOCALE") {
            self.default_locale = locale;
        }
        if let Some(rate) = env_var::<f32>("VERBA_DEFAULT_RATE") {
            self.default_rate = rate;
        }
        if let Some(warm_up) = env_var::<bool>("VERBA_WARM_UP") {
            self.warm_up = warm_up;
        }
        self
    }

    /// Defaults overlaid with the environment
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.default_locale
            .parse::<Locale>()
            .map_err(|e| format!("Invalid default_locale: {}", e))?;

        validate_rate(self.default_rate).map_err(|e| format!("Invalid default_rate: {}", e))?;

        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }

        const MAX_TEXT_LENGTH_LIMIT: usize = 1_000_000;
        if self.max_text_length > MAX_TEXT_LENGTH_LIMIT {
            return Err(format!(
                "max_text_length too large (max {} bytes)",
                MAX_TEXT_LENGTH_LIMIT
            ));
        }

        Ok(())
    }
}

/// Rates must be finite, positive and at most 10x normal speed
pub(crate) fn validate_rate(rate: f32) -> Result<(), String> {
    if !rate.is_finite() {
        return Err("rate must be a finite number".to_string());
    }
    if rate <= 0.0 {
        return Err("rate must be greater than 0".to_string());
    }
    if rate > 10.0 {
        return Err("rate must be at most 10.0".to_string());
    }
    Ok(())
}
