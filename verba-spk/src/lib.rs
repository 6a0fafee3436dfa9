//! verba-spk: native text-to-speech for hybrid apps
//!
//! Exposes a speech engine to JavaScript through the `TTS` plugin:
//! - `speak` / `stop` commands with locale and rate options
//! - transient audio focus held around every utterance
//! - completion and errors reported through the caller's callback
//! - a process-backed native engine (`espeak-ng`) and pluggable engine/focus traits

pub mod config;
pub mod engines;
pub mod error;
pub mod focus;
pub mod locale;
pub mod request;
pub mod speech_adapter;

pub use config::{AudioUsage, FocusApiPreference, SpeechConfig};
pub use engines::native::NativeSpeechEngine;
pub use engines::{InitStatus, LanguageAvailability, SpeechEngine, UtteranceListener};
pub use error::SpeechError;
pub use focus::{AudioFocusArbiter, FocusApi, FocusOutcome, UnarbitratedFocus};
pub use locale::Locale;
pub use request::{SpeakOptions, SpeakRequest, Ticket};
pub use speech_adapter::{EngineState, SpeechAdapter, SERVICE_NAME};
