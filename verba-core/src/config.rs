//! Configuration loading shared by the verba crates

use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Read a configuration file and decode it with [`parse_config`].
pub fn read_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let display = path.to_string_lossy();

    // Refuse traversal sequences; config paths come from host settings
    if display.contains("..") {
        return Err(ConfigError::IoError(format!(
            "Path traversal detected: '{}'",
            display
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", display, e)))?;
    parse_config(&content)
}

/// Decode configuration text. JSON is tried first, then TOML, then YAML.
pub fn parse_config<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    if let Ok(config) = serde_json::from_str::<T>(content) {
        return Ok(config);
    }

    if let Ok(config) = toml::from_str::<T>(content) {
        return Ok(config);
    }

    match serde_yaml::from_str::<T>(content) {
        Ok(config) => Ok(config),
        Err(e) => Err(ConfigError::ParseError(format!(
            "Unknown format or invalid fields: {}",
            e
        ))),
    }
}

/// Read and parse an environment variable.
///
/// Unset variables yield `None`. Values that fail to parse are logged and
/// also yield `None`, leaving the caller's current value in place.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable value for {}: {:?}", key, raw);
            None
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Configuration(err.to_string())
    }
}
