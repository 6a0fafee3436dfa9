//! Native plugin interface consumed by the bridge

use crate::callback::CallbackContext;
use crate::error::Result;
use serde_json::Value;

/// A native service reachable from JavaScript.
///
/// `execute` returns `Ok(false)` for actions the plugin does not know, so
/// the bridge can report "not handled" or try another plugin. Once it
/// returns `Ok(true)` the plugin owns `callback` and completes it, now or
/// later.
pub trait Plugin: Send + Sync {
    fn service_name(&self) -> &str;

    fn execute(&self, action: &str, args: &Value, callback: CallbackContext) -> Result<bool>;

    /// Called when the host tears the plugin down
    fn on_destroy(&self) {}
}
