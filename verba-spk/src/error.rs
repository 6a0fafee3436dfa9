//! Error types for verba-spk

use thiserror::Error;
use verba_core::Error as CoreError;

pub const ERR_INVALID_OPTIONS: &str = "ERR_INVALID_OPTIONS";
pub const ERR_NOT_INITIALIZED: &str = "ERR_NOT_INITIALIZED";
pub const ERR_ERROR_INITIALIZING: &str = "ERR_ERROR_INITIALIZING";
pub const ERR_INVALID_PERMISSIONS: &str = "ERR_INVALID_PERMISSIONS";
pub const ERR_UNKNOWN: &str = "ERR_UNKNOWN";
pub const ERR_INTERRUPTED: &str = "ERR_INTERRUPTED";

/// Speech command errors
///
/// Every variant maps to one of the error codes the JavaScript side
/// understands, see [`SpeechError::code`].
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Speech engine not initialized")]
    NotInitialized,

    #[error("Speech engine failed to initialize")]
    ErrorInitializing,

    #[error("Audio focus denied")]
    FocusDenied,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Utterance interrupted")]
    Interrupted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl SpeechError {
    /// Wire code reported through the callback
    pub fn code(&self) -> &'static str {
        match self {
            SpeechError::InvalidOptions(_) => ERR_INVALID_OPTIONS,
            SpeechError::NotInitialized => ERR_NOT_INITIALIZED,
            SpeechError::ErrorInitializing => ERR_ERROR_INITIALIZING,
            SpeechError::FocusDenied => ERR_INVALID_PERMISSIONS,
            SpeechError::Interrupted => ERR_INTERRUPTED,
            SpeechError::Engine(_)
            | SpeechError::Config(_)
            | SpeechError::Io(_)
            | SpeechError::Core(_) => ERR_UNKNOWN,
        }
    }

    /// Rebuild an error from a wire code received through a callback
    pub fn from_code(code: &str) -> Self {
        match code {
            ERR_INVALID_OPTIONS => SpeechError::InvalidOptions(code.to_string()),
            ERR_NOT_INITIALIZED => SpeechError::NotInitialized,
            ERR_ERROR_INITIALIZING => SpeechError::ErrorInitializing,
            ERR_INVALID_PERMISSIONS => SpeechError::FocusDenied,
            ERR_INTERRUPTED => SpeechError::Interrupted,
            other => SpeechError::Engine(other.to_string()),
        }
    }
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        CoreError::Plugin(format!("Speech error: {}", err))
    }
}

impl From<verba_core::ConfigError> for SpeechError {
    fn from(err: verba_core::ConfigError) -> Self {
        SpeechError::Config(err.to_string())
    }
}
