//! Test doubles shared by the verba-spk integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;
use verba_core::{CallbackContext, CallbackMessage, ChannelSink};
use verba_spk::engines::{InitCallback, InitStatus, LanguageAvailability, SpeechEngine, UtteranceListener};
use verba_spk::focus::{AudioFocusArbiter, FocusApi, FocusOutcome, FocusRequest, ListenerId};
use verba_spk::{Locale, SpeechAdapter, SpeechConfig, SpeechError, Ticket};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetLanguage(Locale),
    SetRate(f32),
    Speak { text: String, ticket: Ticket },
    Stop,
    Shutdown,
}

/// Engine double: records calls, flushes like a real engine and lets the
/// test decide when utterances finish.
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    init: Mutex<Option<InitCallback>>,
    listener: Mutex<Option<Arc<dyn UtteranceListener>>>,
    current: Mutex<Option<Ticket>>,
    fail_speak: AtomicBool,
    fail_stop: AtomicBool,
    availability: Mutex<LanguageAvailability>,
    voice: Mutex<Option<(Locale, f32)>>,
    voiced: Mutex<Vec<(String, Locale, f32)>>,
    rate_delay_ms: AtomicU64,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            init: Mutex::new(None),
            listener: Mutex::new(None),
            current: Mutex::new(None),
            fail_speak: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            availability: Mutex::new(LanguageAvailability::Available),
            voice: Mutex::new(None),
            voiced: Mutex::new(Vec::new()),
            rate_delay_ms: AtomicU64::new(0),
        })
    }

    /// Fire the init callback the adapter registered
    pub fn complete_init(&self, status: InitStatus) {
        let callback = self.init.lock().take().expect("init callback registered");
        callback(status);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Text and ticket of every submitted utterance, warm-up included
    pub fn spoken(&self) -> Vec<(String, Ticket)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Speak { text, ticket } => Some((text.clone(), ticket.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_ticket(&self) -> Ticket {
        self.spoken().last().map(|(_, t)| t.clone()).expect("an utterance was submitted")
    }

    pub fn set_fail_speak(&self, fail: bool) {
        self.fail_speak.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Text of every utterance with the locale and rate the engine held when it was submitted
    pub fn voiced(&self) -> Vec<(String, Locale, f32)> {
        self.voiced.lock().clone()
    }

    /// Slow down `set_rate` to widen races between callers
    pub fn set_rate_delay(&self, delay: Duration) {
        self.rate_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_availability(&self, availability: LanguageAvailability) {
        *self.availability.lock() = availability;
    }

    fn listener(&self) -> Arc<dyn UtteranceListener> {
        self.listener.lock().clone().expect("listener registered")
    }

    pub fn finish_done(&self, ticket: &Ticket) {
        self.clear_current(ticket);
        self.listener().on_done(ticket);
    }

    pub fn finish_error(&self, ticket: &Ticket) {
        self.clear_current(ticket);
        self.listener().on_error(ticket, "synthesis failed");
    }

    pub fn emit_stop(&self, ticket: &Ticket, interrupted: bool) {
        self.clear_current(ticket);
        self.listener().on_stop(ticket, interrupted);
    }

    fn clear_current(&self, ticket: &Ticket) {
        let mut current = self.current.lock();
        if current.as_ref() == Some(ticket) {
            *current = None;
        }
    }
}

impl SpeechEngine for RecordingEngine {
    fn init(&self, on_ready: InitCallback) {
        *self.init.lock() = Some(on_ready);
    }

    fn set_utterance_listener(&self, listener: Arc<dyn UtteranceListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn set_language(&self, locale: &Locale) -> Result<LanguageAvailability, SpeechError> {
        self.calls.lock().push(EngineCall::SetLanguage(locale.clone()));
        let mut voice = self.voice.lock();
        let rate = voice.as_ref().map_or(1.0, |(_, rate)| *rate);
        *voice = Some((locale.clone(), rate));
        drop(voice);
        Ok(*self.availability.lock())
    }

    fn set_rate(&self, rate: f32) -> Result<(), SpeechError> {
        self.calls.lock().push(EngineCall::SetRate(rate));
        let delay = self.rate_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        if let Some((_, current)) = self.voice.lock().as_mut() {
            *current = rate;
        }
        Ok(())
    }

    fn speak(&self, text: &str, ticket: &Ticket) -> Result<(), SpeechError> {
        self.calls.lock().push(EngineCall::Speak {
            text: text.to_string(),
            ticket: ticket.clone(),
        });
        if self.fail_speak.load(Ordering::SeqCst) {
            return Err(SpeechError::Engine("speak refused".to_string()));
        }
        if let Some((locale, rate)) = self.voice.lock().clone() {
            self.voiced.lock().push((text.to_string(), locale, rate));
        }

        // Flush: the replaced utterance reports its stop from inside speak
        let previous = self.current.lock().replace(ticket.clone());
        if let Some(previous) = previous {
            self.listener().on_stop(&previous, true);
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), SpeechError> {
        self.calls.lock().push(EngineCall::Stop);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(SpeechError::Engine("stop refused".to_string()));
        }
        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            self.listener().on_stop(&previous, true);
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.calls.lock().push(EngineCall::Shutdown);
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Arbiter double counting every request and abandon
pub struct RecordingArbiter {
    api: FocusApi,
    outcome: Mutex<FocusOutcome>,
    granted: Mutex<Vec<Uuid>>,
    abandoned: Mutex<Vec<Uuid>>,
    requests: Mutex<Vec<FocusRequest>>,
    stream_requests: Mutex<Vec<ListenerId>>,
}

impl RecordingArbiter {
    pub fn new(api: FocusApi) -> Arc<Self> {
        Arc::new(Self {
            api,
            outcome: Mutex::new(FocusOutcome::Granted),
            granted: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_outcome(&self, outcome: FocusOutcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn granted(&self) -> usize {
        self.granted.lock().len()
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.lock().len()
    }

    pub fn requests(&self) -> Vec<FocusRequest> {
        self.requests.lock().clone()
    }

    pub fn stream_requests(&self) -> Vec<ListenerId> {
        self.stream_requests.lock().clone()
    }

    /// Grants not yet abandoned
    pub fn outstanding(&self) -> usize {
        let abandoned = self.abandoned.lock();
        self.granted
            .lock()
            .iter()
            .filter(|id| !abandoned.contains(id))
            .count()
    }

    /// Every grant abandoned exactly once and nothing else abandoned
    pub fn balanced(&self) -> bool {
        let granted = self.granted.lock();
        let abandoned = self.abandoned.lock();
        granted.len() == abandoned.len()
            && granted
                .iter()
                .all(|id| abandoned.iter().filter(|a| *a == id).count() == 1)
    }

    fn answer(&self, id: Uuid) -> FocusOutcome {
        let outcome = *self.outcome.lock();
        if outcome != FocusOutcome::Denied {
            self.granted.lock().push(id);
        }
        outcome
    }
}

impl AudioFocusArbiter for RecordingArbiter {
    fn newest_api(&self) -> FocusApi {
        self.api
    }

    fn request_focus(&self, request: &FocusRequest) -> FocusOutcome {
        self.requests.lock().push(request.clone());
        self.answer(request.id)
    }

    fn abandon_focus_request(&self, request: &FocusRequest) {
        self.abandoned.lock().push(request.id);
    }

    fn request_stream_focus(&self, listener: ListenerId) -> FocusOutcome {
        self.stream_requests.lock().push(listener);
        self.answer(listener.0)
    }

    fn abandon_stream_focus(&self, listener: ListenerId) {
        self.abandoned.lock().push(listener.0);
    }
}

/// Adapter wired to the recording doubles and a channel sink
pub struct Harness {
    pub adapter: SpeechAdapter,
    pub engine: Arc<RecordingEngine>,
    pub arbiter: Arc<RecordingArbiter>,
    pub results: UnboundedReceiver<CallbackMessage>,
    sink: Arc<ChannelSink>,
}

impl Harness {
    /// Adapter whose engine has not finished initializing
    pub fn new(config: SpeechConfig, api: FocusApi) -> Self {
        let engine = RecordingEngine::new();
        let arbiter = RecordingArbiter::new(api);
        let adapter = SpeechAdapter::new(config, engine.clone(), arbiter.clone())
            .expect("valid config");
        let (sink, results) = ChannelSink::new();
        Self {
            adapter,
            engine,
            arbiter,
            results,
            sink: Arc::new(sink),
        }
    }

    /// Adapter with a ready engine and the warm-up calls cleared
    pub fn ready(config: SpeechConfig, api: FocusApi) -> Self {
        let harness = Self::new(config, api);
        harness.engine.complete_init(InitStatus::Success);
        harness.engine.clear_calls();
        harness
    }

    pub fn ready_default() -> Self {
        Self::ready(SpeechConfig::default(), FocusApi::Request)
    }

    pub fn callback(&self, id: &str) -> CallbackContext {
        CallbackContext::new(id, self.sink.clone())
    }

    /// Callback results delivered so far
    pub fn drain(&mut self) -> Vec<CallbackMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.results.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Error code carried by a callback message, if it failed
pub fn error_code(message: &CallbackMessage) -> Option<&str> {
    message.result.error_message()
}
