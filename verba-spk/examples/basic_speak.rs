//! Basic speech example
//!
//! Speaks through `espeak-ng`, once through the typed API and once the way
//! the bridge would call the plugin.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use verba_core::{CallbackContext, ChannelSink, Plugin};
use verba_spk::{NativeSpeechEngine, SpeakRequest, SpeechAdapter, SpeechConfig, UnarbitratedFocus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let config = SpeechConfig::from_env();
    let engine = Arc::new(NativeSpeechEngine::new()?);
    let focus = Arc::new(UnarbitratedFocus::new());
    let adapter = SpeechAdapter::new(config.clone(), engine, focus.clone())?;

    // Initialization is asynchronous
    for _ in 0..50 {
        if adapter.is_ready() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if !adapter.is_ready() {
        anyhow::bail!("speech engine not ready (state {:?}); is espeak-ng installed?", adapter.state());
    }

    let request = SpeakRequest::new("Hello from the native speech engine.", "en-US", 1.0, &config)?;
    adapter.speak_and_wait(request).await?;
    println!("Typed request finished");

    let (sink, mut results) = ChannelSink::new();
    let callback = CallbackContext::new("speak-1", Arc::new(sink));
    let args = json!([{ "text": "Bonjour tout le monde.", "locale": "fr-FR", "rate": 0.9 }]);
    adapter.execute("speak", &args, callback)?;

    if let Some(message) = results.recv().await {
        println!("Callback {} finished with {:?}", message.callback_id, message.result);
    }

    adapter.shutdown();
    println!("Outstanding focus grants: {}", focus.outstanding());
    Ok(())
}
