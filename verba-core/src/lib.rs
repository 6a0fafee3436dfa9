//! verba-core: bridge plumbing shared by verba plugins
//!
//! - callback contexts and sinks for answering JavaScript calls
//! - the `Plugin` trait native services implement
//! - configuration loading (JSON, TOML, YAML) and the shared error type

pub mod callback;
pub mod config;
pub mod error;
pub mod plugin;

pub use callback::{CallbackContext, CallbackMessage, CallbackSink, ChannelSink, PluginResult, PluginStatus};
pub use config::ConfigError;
pub use error::{Error, Result};
pub use plugin::Plugin;
