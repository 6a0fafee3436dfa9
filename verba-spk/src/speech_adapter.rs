//! Speech command adapter: the `speak` / `stop` plugin
//!
//! Validates bridge commands, holds audio focus around each utterance and
//! routes the engine's asynchronous utterance events back to the caller
//! that started the utterance.

use crate::config::SpeechConfig;
use crate::engines::{InitStatus, LanguageAvailability, SpeechEngine, UtteranceListener};
use crate::error::{SpeechError, ERR_INTERRUPTED, ERR_UNKNOWN};
use crate::focus::{focus_source, AudioFocusArbiter, FocusApi, FocusGrant, FocusSource};
use crate::locale::Locale;
use crate::request::{SpeakOptions, SpeakRequest, Ticket};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use verba_core::{CallbackContext, CallbackSink, Plugin, PluginResult};

/// Service name the bridge routes to this plugin
pub const SERVICE_NAME: &str = "TTS";

/// Engine lifecycle as seen by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    /// Initialization failed; the engine handle is unusable
    Unusable,
    ShutDown,
}

enum Terminal {
    Done,
    Error(String),
    Stopped { interrupted: bool },
}

struct PendingUtterance {
    callback: CallbackContext,
    grant: Box<dyn FocusGrant>,
}

struct AdapterInner {
    config: Arc<SpeechConfig>,
    engine: Arc<dyn SpeechEngine>,
    focus: Arc<dyn FocusSource>,
    state: RwLock<EngineState>,
    pending: Mutex<HashMap<Ticket, PendingUtterance>>,
    /// Held from `set_language` through `speak` so voice settings and text
    /// reach the engine together. Engine events never take it.
    submission: Mutex<()>,
}

/// Speech adapter implementing [`Plugin`] for the hybrid-app bridge
pub struct SpeechAdapter {
    inner: Arc<AdapterInner>,
}

impl SpeechAdapter {
    /// Create the adapter and start engine initialization.
    ///
    /// Returns before the engine is ready; `speak` reports
    /// `ERR_NOT_INITIALIZED` until the engine's init callback succeeds.
    pub fn new(
        config: SpeechConfig,
        engine: Arc<dyn SpeechEngine>,
        arbiter: Arc<dyn AudioFocusArbiter>,
    ) -> Result<Self, SpeechError> {
        config
            .validate()
            .map_err(|e| SpeechError::Config(format!("Invalid speech config: {}", e)))?;

        let focus = focus_source(&config, arbiter);
        let inner = Arc::new(AdapterInner {
            config: Arc::new(config),
            engine,
            focus,
            state: RwLock::new(EngineState::Uninitialized),
            pending: Mutex::new(HashMap::new()),
            submission: Mutex::new(()),
        });

        inner.engine.set_utterance_listener(Arc::new(AdapterListener {
            inner: Arc::downgrade(&inner),
        }));

        let weak = Arc::downgrade(&inner);
        inner.engine.init(Box::new(move |status| match weak.upgrade() {
            Some(inner) => inner.on_engine_ready(status),
            None => debug!("Engine init finished after adapter was dropped"),
        }));

        info!("Speech adapter created with {} engine", inner.engine.name());
        Ok(Self { inner })
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.inner.config
    }

    pub fn state(&self) -> EngineState {
        *self.inner.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    /// Focus API generation chosen at construction
    pub fn focus_api(&self) -> FocusApi {
        self.inner.focus.api()
    }

    /// Utterances submitted but not yet finished
    pub fn pending_utterances(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Handle a `speak` command from the bridge.
    ///
    /// Validation and lifecycle errors complete `callback` immediately;
    /// otherwise it completes when the utterance ends.
    pub fn speak(&self, args: &Value, callback: CallbackContext) {
        let inner = &self.inner;
        let submitted = SpeakOptions::from_args(args)
            .and_then(|options| {
                inner.check_ready()?;
                options.into_request(&inner.config)
            })
            .and_then(|request| inner.submit(request, callback.clone()));

        if let Err(e) = submitted {
            warn!("speak rejected: {}", e);
            callback.error(e.code());
        }
    }

    /// Speak an already validated request
    pub fn speak_request(&self, request: SpeakRequest, callback: CallbackContext) {
        let submitted = self
            .inner
            .check_ready()
            .and_then(|_| self.inner.submit(request, callback.clone()));

        if let Err(e) = submitted {
            warn!("speak rejected: {}", e);
            callback.error(e.code());
        }
    }

    /// Speak and wait for the utterance to finish
    pub async fn speak_and_wait(&self, request: SpeakRequest) -> Result<(), SpeechError> {
        let (sender, receiver) = oneshot::channel();
        let callback = CallbackContext::new(
            uuid::Uuid::new_v4().to_string(),
            Arc::new(OneshotSink(Mutex::new(Some(sender)))),
        );
        self.speak_request(request, callback);

        // A dropped callback means the utterance ended without a report
        let result = receiver.await.map_err(|_| SpeechError::Interrupted)?;
        if result.is_ok() {
            Ok(())
        } else {
            Err(SpeechError::from_code(result.error_message().unwrap_or(ERR_UNKNOWN)))
        }
    }

    /// Handle a `stop` command from the bridge.
    ///
    /// Acknowledged immediately. The interrupted utterance, if any, is
    /// resolved through its own stop event.
    pub fn stop(&self, callback: CallbackContext) {
        let stopped = self
            .inner
            .check_ready()
            .and_then(|_| self.inner.engine.stop());

        match stopped {
            Ok(()) => callback.success(),
            Err(e) => {
                warn!("stop failed: {}", e);
                callback.error(e.code());
            }
        }
    }

    /// Stop speaking, release every focus grant and fail pending callers.
    ///
    /// Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Drop for SpeechAdapter {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl Plugin for SpeechAdapter {
    fn service_name(&self) -> &str {
        SERVICE_NAME
    }

    fn execute(&self, action: &str, args: &Value, callback: CallbackContext) -> verba_core::Result<bool> {
        match action {
            "speak" => self.speak(args, callback),
            "stop" => self.stop(callback),
            _ => {
                debug!("Action {} not handled by {}", action, SERVICE_NAME);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn on_destroy(&self) {
        self.shutdown();
    }
}

impl AdapterInner {
    fn check_ready(&self) -> Result<(), SpeechError> {
        match *self.state.read() {
            EngineState::Ready => Ok(()),
            EngineState::Uninitialized | EngineState::ShutDown => Err(SpeechError::NotInitialized),
            EngineState::Unusable => Err(SpeechError::ErrorInitializing),
        }
    }

    fn on_engine_ready(&self, status: InitStatus) {
        let state = *self.state.read();
        if state != EngineState::Uninitialized {
            warn!("Ignoring engine init callback ({:?}) in state {:?}", status, state);
            return;
        }

        if status == InitStatus::Failure {
            let mut state = self.state.write();
            if *state == EngineState::Uninitialized {
                *state = EngineState::Unusable;
            }
            error!("Speech engine {} failed to initialize", self.engine.name());
            return;
        }

        if self.config.warm_up {
            self.warm_up();
        }

        let mut state = self.state.write();
        if *state == EngineState::Uninitialized {
            *state = EngineState::Ready;
            info!("Speech engine {} ready", self.engine.name());
        }
    }

    /// Speak nothing once so the engine loads its voice data before the first real request
    fn warm_up(&self) {
        let _submission = self.submission.lock();
        let warmed = Locale::parse(&self.config.default_locale).and_then(|locale| {
            self.engine.set_language(&locale)?;
            self.engine.set_rate(self.config.default_rate)?;
            self.engine.speak("", &Ticket::none())
        });

        if let Err(e) = warmed {
            warn!("Engine warm-up failed: {}", e);
        }
    }

    fn submit(&self, request: SpeakRequest, callback: CallbackContext) -> Result<(), SpeechError> {
        // Dropping the grant on any early return abandons the focus
        let grant = self.focus.acquire()?;
        if grant.is_delayed() {
            debug!("Speaking with delayed audio focus");
        }

        let _submission = self.submission.lock();
        match self.engine.set_language(&request.locale)? {
            LanguageAvailability::Available => {}
            availability => warn!(
                "Locale {} reported {:?}, engine falls back to its default voice",
                request.locale, availability
            ),
        }
        self.engine.set_rate(request.rate)?;

        let ticket = Ticket::generate();
        debug!(
            "Submitting utterance {} for callback {} ({} bytes, {}, rate {})",
            ticket,
            callback.callback_id(),
            request.text.len(),
            request.locale,
            request.rate
        );

        // Registered before submission so an immediate terminal event finds it
        self.pending
            .lock()
            .insert(ticket.clone(), PendingUtterance { callback, grant });

        // Shutdown may have drained the map between check_ready and the insert
        if *self.state.read() == EngineState::ShutDown {
            let orphaned = self.pending.lock().remove(&ticket);
            return match orphaned {
                Some(orphaned) => {
                    orphaned.grant.release();
                    Err(SpeechError::NotInitialized)
                }
                None => Ok(()),
            };
        }

        if let Err(e) = self.engine.speak(&request.text, &ticket) {
            let failed = self.pending.lock().remove(&ticket);
            if let Some(failed) = failed {
                failed.grant.release();
            }
            return Err(e);
        }
        Ok(())
    }

    fn finish(&self, ticket: &Ticket, terminal: Terminal) {
        if ticket.is_empty() {
            debug!("Fire-and-forget utterance finished");
            return;
        }

        let pending = self.pending.lock().remove(ticket);
        let Some(pending) = pending else {
            debug!("No pending utterance for {}", ticket);
            return;
        };

        pending.grant.release();
        match terminal {
            Terminal::Done => {
                debug!("Utterance {} done", ticket);
                pending.callback.success();
            }
            Terminal::Error(detail) => {
                warn!("Utterance {} failed: {}", ticket, detail);
                pending.callback.error(ERR_UNKNOWN);
            }
            Terminal::Stopped { interrupted } => {
                debug!("Utterance {} stopped (interrupted: {})", ticket, interrupted);
                if self.config.report_interruptions {
                    pending.callback.error(ERR_INTERRUPTED);
                }
            }
        }
    }

    fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if *state == EngineState::ShutDown {
                return;
            }
            *state = EngineState::ShutDown;
        }

        // Taken first so the stop event below cannot resolve them
        let drained: Vec<PendingUtterance> = self.pending.lock().drain().map(|(_, p)| p).collect();

        if let Err(e) = self.engine.stop() {
            warn!("Engine stop during shutdown failed: {}", e);
        }
        self.engine.shutdown();

        let count = drained.len();
        for pending in drained {
            pending.grant.release();
            pending.callback.error(ERR_INTERRUPTED);
        }
        info!("Speech adapter shut down ({} pending utterances cancelled)", count);
    }
}

/// Routes engine events into the adapter without keeping it alive
struct AdapterListener {
    inner: Weak<AdapterInner>,
}

impl AdapterListener {
    fn finish(&self, ticket: &Ticket, terminal: Terminal) {
        if let Some(inner) = self.inner.upgrade() {
            inner.finish(ticket, terminal);
        }
    }
}

impl UtteranceListener for AdapterListener {
    fn on_start(&self, ticket: &Ticket) {
        debug!("Utterance {} started", ticket);
    }

    fn on_done(&self, ticket: &Ticket) {
        self.finish(ticket, Terminal::Done);
    }

    fn on_error(&self, ticket: &Ticket, detail: &str) {
        self.finish(ticket, Terminal::Error(detail.to_string()));
    }

    fn on_stop(&self, ticket: &Ticket, interrupted: bool) {
        self.finish(ticket, Terminal::Stopped { interrupted });
    }
}

struct OneshotSink(Mutex<Option<oneshot::Sender<PluginResult>>>);

impl CallbackSink for OneshotSink {
    fn send(&self, _callback_id: &str, result: PluginResult) -> verba_core::Result<()> {
        let sender = self.0.lock().take();
        match sender {
            Some(sender) => sender
                .send(result)
                .map_err(|_| verba_core::Error::Callback("Result receiver dropped".to_string())),
            None => Err(verba_core::Error::Callback("Result already delivered".to_string())),
        }
    }
}
