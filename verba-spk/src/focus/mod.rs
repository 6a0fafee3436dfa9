//! Audio focus arbitration
//!
//! Platforms expose two generations of focus API: focus-request objects
//! carrying a usage attribute, and the older stream + listener calls. The
//! adapter only sees [`FocusSource`] and [`FocusGrant`]; which generation
//! backs them is decided once by [`focus_source`].

mod request;
mod stream;
mod unarbitrated;

pub use request::{RequestFocus, RequestGrant};
pub use stream::{StreamFocus, StreamGrant};
pub use unarbitrated::UnarbitratedFocus;

use crate::config::{AudioUsage, FocusApiPreference, SpeechConfig};
use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Focus API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusApi {
    Request,
    Stream,
}

/// Arbiter answer to a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Granted,
    /// Accepted, focus arrives later; the request must still be abandoned
    Delayed,
    Denied,
}

/// A focus request object; abandoning requires the same object.
///
/// Always asks for transient focus that lets other audio duck.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusRequest {
    pub id: Uuid,
    /// Usage attribute; content is always speech
    pub usage: AudioUsage,
    pub accepts_delayed_gain: bool,
}

/// Identity of a legacy focus-change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The platform's audio focus service
pub trait AudioFocusArbiter: Send + Sync {
    /// Newest API generation this platform supports
    fn newest_api(&self) -> FocusApi;

    fn request_focus(&self, request: &FocusRequest) -> FocusOutcome;

    fn abandon_focus_request(&self, request: &FocusRequest);

    /// Transient, duckable focus on the music stream for `listener`
    fn request_stream_focus(&self, listener: ListenerId) -> FocusOutcome;

    fn abandon_stream_focus(&self, listener: ListenerId);
}

/// Focus held for one utterance.
///
/// Released exactly once: by [`FocusGrant::release`] or, failing that, on drop.
pub trait FocusGrant: Send {
    fn api(&self) -> FocusApi;

    /// Whether the arbiter only promised focus for later
    fn is_delayed(&self) -> bool;

    fn release(self: Box<Self>);
}

/// Acquires transient, duckable speech focus
pub trait FocusSource: Send + Sync {
    fn api(&self) -> FocusApi;

    /// `SpeechError::FocusDenied` when the arbiter refuses
    fn acquire(&self) -> Result<Box<dyn FocusGrant>, SpeechError>;
}

/// Pick the focus source for this process
pub fn focus_source(config: &SpeechConfig, arbiter: Arc<dyn AudioFocusArbiter>) -> Arc<dyn FocusSource> {
    let newest = arbiter.newest_api();
    let api = match (config.focus_api, newest) {
        (FocusApiPreference::Auto, api) => api,
        (FocusApiPreference::Stream, _) => FocusApi::Stream,
        (FocusApiPreference::Request, FocusApi::Request) => FocusApi::Request,
        (FocusApiPreference::Request, FocusApi::Stream) => {
            warn!("Focus request API unavailable on this platform, using stream focus");
            FocusApi::Stream
        }
    };

    info!("Using {:?} audio focus API", api);
    match api {
        FocusApi::Request => Arc::new(RequestFocus::new(
            arbiter,
            config.focus_usage,
            config.accept_delayed_focus,
        )),
        FocusApi::Stream => Arc::new(StreamFocus::new(arbiter)),
    }
}
