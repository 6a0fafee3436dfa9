//! Native speech engine backed by an `espeak-ng` compatible program
//!
//! Every utterance runs as its own child process. Flushing or stopping
//! kills the running child and reports `on_stop` for its ticket.

use crate::engines::{InitCallback, InitStatus, LanguageAvailability, SpeechEngine, UtteranceListener};
use crate::error::SpeechError;
use crate::locale::Locale;
use crate::request::Ticket;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// espeak-ng speaks at 175 words per minute by default
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const MIN_WORDS_PER_MINUTE: f32 = 80.0;
const MAX_WORDS_PER_MINUTE: f32 = 450.0;

type ListenerSlot = Arc<RwLock<Option<Arc<dyn UtteranceListener>>>>;

struct VoiceSettings {
    locale: Locale,
    rate: f32,
}

struct Running {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

/// Process-backed native TTS engine
pub struct NativeSpeechEngine {
    program: PathBuf,
    runtime: Handle,
    listener: ListenerSlot,
    settings: Mutex<VoiceSettings>,
    current: Arc<Mutex<Option<Running>>>,
    generation: AtomicU64,
    shut_down: AtomicBool,
}

impl NativeSpeechEngine {
    /// Engine driving `espeak-ng` from `PATH`
    pub fn new() -> Result<Self, SpeechError> {
        Self::with_program("espeak-ng")
    }

    /// Engine driving a specific program.
    ///
    /// Must be called from within a tokio runtime; child processes are
    /// spawned and awaited on that runtime.
    pub fn with_program(program: impl Into<PathBuf>) -> Result<Self, SpeechError> {
        let runtime = Handle::try_current().map_err(|_| {
            SpeechError::Engine(
                "No tokio runtime available. The native engine must be created within a tokio runtime context."
                    .to_string(),
            )
        })?;

        Ok(Self {
            program: program.into(),
            runtime,
            listener: Arc::new(RwLock::new(None)),
            settings: Mutex::new(VoiceSettings {
                locale: Locale::new("en", "US"),
                rate: 1.0,
            }),
            current: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Whether an utterance is currently playing
    pub fn is_speaking(&self) -> bool {
        self.current.lock().is_some()
    }

    fn cancel_current(&self) -> bool {
        let running = self.current.lock().take();
        match running {
            Some(running) => {
                // The utterance task may already be exiting; a closed channel is fine
                let _ = running.cancel.send(());
                true
            }
            None => false,
        }
    }
}

/// espeak-ng voice names are lowercase `language-region`
pub fn voice_name(locale: &Locale) -> String {
    locale.to_string().to_lowercase()
}

/// Map a relative rate (1.0 = normal) to espeak-ng words per minute
pub fn words_per_minute(rate: f32) -> u32 {
    (BASE_WORDS_PER_MINUTE * rate)
        .round()
        .clamp(MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE) as u32
}

impl SpeechEngine for NativeSpeechEngine {
    fn init(&self, on_ready: InitCallback) {
        let program = self.program.clone();
        self.runtime.spawn(async move {
            let probe = Command::new(&program)
                .arg("--version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            let status = match probe {
                Ok(exit) if exit.success() => {
                    info!("Native TTS engine ready ({})", program.display());
                    InitStatus::Success
                }
                Ok(exit) => {
                    warn!("{} --version exited with {}", program.display(), exit);
                    InitStatus::Failure
                }
                Err(e) => {
                    warn!("Native TTS engine not available ({}): {}", program.display(), e);
                    InitStatus::Failure
                }
            };
            on_ready(status);
        });
    }

    fn set_utterance_listener(&self, listener: Arc<dyn UtteranceListener>) {
        *self.listener.write() = Some(listener);
    }

    fn set_language(&self, locale: &Locale) -> Result<LanguageAvailability, SpeechError> {
        self.settings.lock().locale = locale.clone();
        Ok(LanguageAvailability::Available)
    }

    fn set_rate(&self, rate: f32) -> Result<(), SpeechError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SpeechError::Engine(format!("Invalid speech rate {}", rate)));
        }
        self.settings.lock().rate = rate;
        Ok(())
    }

    fn speak(&self, text: &str, ticket: &Ticket) -> Result<(), SpeechError> {
        let (voice, wpm) = {
            let settings = self.settings.lock();
            (voice_name(&settings.locale), words_per_minute(settings.rate))
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let (cancel, cancelled) = oneshot::channel();
        let previous = {
            // Checked under the slot lock so shutdown cannot slip in before the swap
            let mut current = self.current.lock();
            if self.shut_down.load(Ordering::Acquire) {
                return Err(SpeechError::Engine("Native TTS engine has been shut down".to_string()));
            }
            current.replace(Running { generation, cancel })
        };
        if let Some(previous) = previous {
            debug!("Flushing utterance generation {}", previous.generation);
            let _ = previous.cancel.send(());
        }

        let utterance = Utterance {
            program: self.program.clone(),
            voice,
            wpm,
            text: text.to_string(),
            ticket: ticket.clone(),
            generation,
        };
        self.runtime.spawn(utterance.run(
            cancelled,
            self.listener.clone(),
            self.current.clone(),
        ));
        Ok(())
    }

    fn stop(&self) -> Result<(), SpeechError> {
        if self.cancel_current() {
            debug!("Stopped native utterance");
        }
        Ok(())
    }

    fn shutdown(&self) {
        let running = {
            let mut current = self.current.lock();
            if self.shut_down.swap(true, Ordering::AcqRel) {
                return;
            }
            current.take()
        };
        if let Some(running) = running {
            let _ = running.cancel.send(());
        }
        info!("Native TTS engine shut down");
    }

    fn name(&self) -> &str {
        "native"
    }
}

struct Utterance {
    program: PathBuf,
    voice: String,
    wpm: u32,
    text: String,
    ticket: Ticket,
    generation: u64,
}

impl Utterance {
    async fn run(
        self,
        mut cancelled: oneshot::Receiver<()>,
        listener: ListenerSlot,
        current: Arc<Mutex<Option<Running>>>,
    ) {
        let listener = listener.read().clone();

        let spawned = Command::new(&self.program)
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.wpm.to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn {}: {}", self.program.display(), e);
                self.finish(&current);
                if let Some(listener) = &listener {
                    listener.on_error(&self.ticket, &e.to_string());
                }
                return;
            }
        };

        if let Some(listener) = &listener {
            listener.on_start(&self.ticket);
        }

        if let Some(mut stdin) = child.stdin.take() {
            if !self.text.is_empty() {
                if let Err(e) = stdin.write_all(self.text.as_bytes()).await {
                    // The program may exit without reading its input
                    debug!("Could not write utterance text: {}", e);
                }
            }
            drop(stdin);
        }

        tokio::select! {
            biased;
            // A dropped sender means the engine went away; treat it as a stop
            _ = &mut cancelled => {
                if let Err(e) = child.kill().await {
                    debug!("Kill after stop failed: {}", e);
                }
                debug!("Utterance {} interrupted", self.ticket);
                if let Some(listener) = &listener {
                    listener.on_stop(&self.ticket, true);
                }
            }
            status = child.wait() => {
                self.finish(&current);
                let Some(listener) = &listener else { return };
                match status {
                    Ok(exit) if exit.success() => listener.on_done(&self.ticket),
                    Ok(exit) => listener.on_error(&self.ticket, &format!("{} exited with {}", self.program.display(), exit)),
                    Err(e) => listener.on_error(&self.ticket, &e.to_string()),
                }
            }
        }
    }

    /// Clear the running slot if it still belongs to this utterance
    fn finish(&self, current: &Mutex<Option<Running>>) {
        let mut slot = current.lock();
        if slot.as_ref().map(|r| r.generation) == Some(self.generation) {
            *slot = None;
        }
    }
}
