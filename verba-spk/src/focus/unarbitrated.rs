use super::{AudioFocusArbiter, FocusApi, FocusOutcome, FocusRequest, ListenerId};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

/// Arbiter for hosts without audio focus arbitration.
///
/// Every request is granted. Outstanding grants are tracked so hosts can
/// check that each one was abandoned.
#[derive(Debug, Default)]
pub struct UnarbitratedFocus {
    held: Mutex<HashSet<Uuid>>,
}

impl UnarbitratedFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants not yet abandoned
    pub fn outstanding(&self) -> usize {
        self.held.lock().len()
    }

    fn abandon(&self, id: Uuid) {
        if !self.held.lock().remove(&id) {
            warn!("Abandoning unknown focus holder {}", id);
        }
    }
}

impl AudioFocusArbiter for UnarbitratedFocus {
    fn newest_api(&self) -> FocusApi {
        FocusApi::Request
    }

    fn request_focus(&self, request: &FocusRequest) -> FocusOutcome {
        self.held.lock().insert(request.id);
        FocusOutcome::Granted
    }

    fn abandon_focus_request(&self, request: &FocusRequest) {
        self.abandon(request.id);
    }

    fn request_stream_focus(&self, listener: ListenerId) -> FocusOutcome {
        self.held.lock().insert(listener.0);
        FocusOutcome::Granted
    }

    fn abandon_stream_focus(&self, listener: ListenerId) {
        self.abandon(listener.0);
    }
}
