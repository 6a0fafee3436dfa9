//! Speech engine interface and implementations

pub mod native;

use crate::error::SpeechError;
use crate::locale::Locale;
use crate::request::Ticket;
use std::sync::Arc;

/// Outcome of asynchronous engine initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Success,
    Failure,
}

/// Callback fired once when the engine finishes initializing
pub type InitCallback = Box<dyn FnOnce(InitStatus) + Send + 'static>;

/// How well the engine supports a requested locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageAvailability {
    Available,
    MissingData,
    NotSupported,
}

/// Receives per-utterance progress from an engine.
///
/// Engines may call these from any thread, including from inside
/// [`SpeechEngine::speak`] or [`SpeechEngine::stop`].
pub trait UtteranceListener: Send + Sync {
    fn on_start(&self, ticket: &Ticket);

    fn on_done(&self, ticket: &Ticket);

    fn on_error(&self, ticket: &Ticket, detail: &str);

    /// The utterance was flushed or stopped before completing
    fn on_stop(&self, ticket: &Ticket, interrupted: bool);
}

/// A platform text-to-speech engine
///
/// Utterances are submitted with flush semantics: a new `speak` discards
/// whatever is queued or playing, and the discarded utterance reports
/// `on_stop`.
pub trait SpeechEngine: Send + Sync {
    /// Start initializing; `on_ready` fires exactly once, possibly on another thread
    fn init(&self, on_ready: InitCallback);

    fn set_utterance_listener(&self, listener: Arc<dyn UtteranceListener>);

    fn set_language(&self, locale: &Locale) -> Result<LanguageAvailability, SpeechError>;

    fn set_rate(&self, rate: f32) -> Result<(), SpeechError>;

    fn speak(&self, text: &str, ticket: &Ticket) -> Result<(), SpeechError>;

    fn stop(&self) -> Result<(), SpeechError>;

    /// Release engine resources; the engine is unusable afterwards
    fn shutdown(&self);

    fn name(&self) -> &str;
}
