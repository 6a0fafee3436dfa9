use super::{AudioFocusArbiter, FocusApi, FocusGrant, FocusOutcome, FocusSource, ListenerId};
use crate::error::SpeechError;
use std::sync::Arc;
use tracing::debug;

/// Focus through the legacy stream + listener API.
///
/// Each grant registers its own listener so abandoning one utterance's
/// focus never drops another's.
pub struct StreamFocus {
    arbiter: Arc<dyn AudioFocusArbiter>,
}

impl StreamFocus {
    pub fn new(arbiter: Arc<dyn AudioFocusArbiter>) -> Self {
        Self { arbiter }
    }
}

impl FocusSource for StreamFocus {
    fn api(&self) -> FocusApi {
        FocusApi::Stream
    }

    fn acquire(&self) -> Result<Box<dyn FocusGrant>, SpeechError> {
        let listener = ListenerId::new();
        let outcome = self.arbiter.request_stream_focus(listener);

        match outcome {
            FocusOutcome::Granted => Ok(Box::new(StreamGrant {
                arbiter: Some(self.arbiter.clone()),
                listener,
            })),
            // The stream API has no delayed grants; anything else is a refusal
            FocusOutcome::Delayed => {
                self.arbiter.abandon_stream_focus(listener);
                Err(SpeechError::FocusDenied)
            }
            FocusOutcome::Denied => Err(SpeechError::FocusDenied),
        }
    }
}

pub struct StreamGrant {
    arbiter: Option<Arc<dyn AudioFocusArbiter>>,
    listener: ListenerId,
}

impl StreamGrant {
    fn abandon(&mut self) {
        if let Some(arbiter) = self.arbiter.take() {
            arbiter.abandon_stream_focus(self.listener);
            debug!("Abandoned stream focus for listener {}", self.listener);
        }
    }
}

impl FocusGrant for StreamGrant {
    fn api(&self) -> FocusApi {
        FocusApi::Stream
    }

    fn is_delayed(&self) -> bool {
        false
    }

    fn release(mut self: Box<Self>) {
        self.abandon();
    }
}

impl Drop for StreamGrant {
    fn drop(&mut self) {
        self.abandon();
    }
}
