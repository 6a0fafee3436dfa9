use super::{AudioFocusArbiter, FocusApi, FocusGrant, FocusOutcome, FocusRequest, FocusSource};
use crate::config::AudioUsage;
use crate::error::SpeechError;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Focus through request objects carrying a usage attribute
pub struct RequestFocus {
    arbiter: Arc<dyn AudioFocusArbiter>,
    usage: AudioUsage,
    accept_delayed: bool,
}

impl RequestFocus {
    pub fn new(arbiter: Arc<dyn AudioFocusArbiter>, usage: AudioUsage, accept_delayed: bool) -> Self {
        Self {
            arbiter,
            usage,
            accept_delayed,
        }
    }
}

impl FocusSource for RequestFocus {
    fn api(&self) -> FocusApi {
        FocusApi::Request
    }

    fn acquire(&self) -> Result<Box<dyn FocusGrant>, SpeechError> {
        let request = FocusRequest {
            id: Uuid::new_v4(),
            usage: self.usage,
            accepts_delayed_gain: self.accept_delayed,
        };

        match self.arbiter.request_focus(&request) {
            FocusOutcome::Granted => Ok(Box::new(RequestGrant::new(self.arbiter.clone(), request, false))),
            FocusOutcome::Delayed if self.accept_delayed => {
                debug!("Focus request {} delayed", request.id);
                Ok(Box::new(RequestGrant::new(self.arbiter.clone(), request, true)))
            }
            FocusOutcome::Delayed => {
                // Pending requests still occupy the focus stack
                self.arbiter.abandon_focus_request(&request);
                Err(SpeechError::FocusDenied)
            }
            FocusOutcome::Denied => Err(SpeechError::FocusDenied),
        }
    }
}

pub struct RequestGrant {
    arbiter: Option<Arc<dyn AudioFocusArbiter>>,
    request: FocusRequest,
    delayed: bool,
}

impl RequestGrant {
    fn new(arbiter: Arc<dyn AudioFocusArbiter>, request: FocusRequest, delayed: bool) -> Self {
        Self {
            arbiter: Some(arbiter),
            request,
            delayed,
        }
    }

    fn abandon(&mut self) {
        if let Some(arbiter) = self.arbiter.take() {
            arbiter.abandon_focus_request(&self.request);
            debug!("Abandoned focus request {}", self.request.id);
        }
    }
}

impl FocusGrant for RequestGrant {
    fn api(&self) -> FocusApi {
        FocusApi::Request
    }

    fn is_delayed(&self) -> bool {
        self.delayed
    }

    fn release(mut self: Box<Self>) {
        self.abandon();
    }
}

impl Drop for RequestGrant {
    fn drop(&mut self) {
        self.abandon();
    }
}
