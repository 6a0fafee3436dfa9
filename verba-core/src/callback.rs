//! Callback plumbing between native plugins and the hybrid-app bridge
//!
//! A [`CallbackContext`] is the native half of one pending JavaScript call.
//! It completes exactly once; the bridge learns about the completion through
//! a [`CallbackSink`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outcome reported to the JavaScript side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Ok,
    Error,
}

/// Result delivered for one callback id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResult {
    pub status: PluginStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl PluginResult {
    /// Success without payload
    pub fn ok() -> Self {
        Self {
            status: PluginStatus::Ok,
            message: None,
        }
    }

    pub fn ok_with(message: Value) -> Self {
        Self {
            status: PluginStatus::Ok,
            message: Some(message),
        }
    }

    /// Failure carrying an error string (plugins send their error codes here)
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PluginStatus::Error,
            message: Some(Value::String(message.into())),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PluginStatus::Ok
    }

    /// Error message as a string, if this is a string-carrying failure
    pub fn error_message(&self) -> Option<&str> {
        match (&self.status, &self.message) {
            (PluginStatus::Error, Some(Value::String(s))) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Destination for completed callbacks (the web view side of the bridge)
pub trait CallbackSink: Send + Sync {
    fn send(&self, callback_id: &str, result: PluginResult) -> Result<()>;
}

/// One-shot handle for answering a single bridge call
#[derive(Clone)]
pub struct CallbackContext {
    callback_id: String,
    sink: Arc<dyn CallbackSink>,
    finished: Arc<AtomicBool>,
}

impl CallbackContext {
    pub fn new(callback_id: impl Into<String>, sink: Arc<dyn CallbackSink>) -> Self {
        Self {
            callback_id: callback_id.into(),
            sink,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn success(&self) {
        self.send_plugin_result(PluginResult::ok());
    }

    pub fn error(&self, message: &str) {
        self.send_plugin_result(PluginResult::error(message));
    }

    /// Deliver `result` unless this context already completed.
    ///
    /// Returns whether the result was handed to the sink.
    pub fn send_plugin_result(&self, result: PluginResult) -> bool {
        if self.finished.swap(true, Ordering::AcqRel) {
            warn!(
                "Callback {} already finished, dropping {:?}",
                self.callback_id, result.status
            );
            return false;
        }

        debug!("Completing callback {} with {:?}", self.callback_id, result.status);
        if let Err(e) = self.sink.send(&self.callback_id, result) {
            warn!("Failed to deliver callback {}: {}", self.callback_id, e);
            return false;
        }
        true
    }
}

impl fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackContext")
            .field("callback_id", &self.callback_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Callback delivered through a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackMessage {
    pub callback_id: String,
    pub result: PluginResult,
}

/// Sink that forwards completions into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<CallbackMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallbackMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CallbackSink for ChannelSink {
    fn send(&self, callback_id: &str, result: PluginResult) -> Result<()> {
        self.sender
            .send(CallbackMessage {
                callback_id: callback_id.to_string(),
                result,
            })
            .map_err(|_| Error::Callback("Callback receiver dropped".to_string()))
    }
}
