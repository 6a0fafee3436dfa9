//! Tests for audio focus selection and grants

mod common;

use common::RecordingArbiter;
use std::sync::Arc;
use verba_spk::config::{AudioUsage, FocusApiPreference, SpeechConfig};
use verba_spk::focus::{focus_source, AudioFocusArbiter, FocusApi, FocusOutcome};
use verba_spk::{SpeechError, UnarbitratedFocus};

fn config_with(preference: FocusApiPreference) -> SpeechConfig {
    let mut config = SpeechConfig::default();
    config.focus_api = preference;
    config
}

#[test]
fn test_auto_uses_newest_api() {
    let request = RecordingArbiter::new(FocusApi::Request);
    let stream = RecordingArbiter::new(FocusApi::Stream);
    let config = SpeechConfig::default();

    assert_eq!(focus_source(&config, request).api(), FocusApi::Request);
    assert_eq!(focus_source(&config, stream).api(), FocusApi::Stream);
}

#[test]
fn test_explicit_preferences() {
    let arbiter = RecordingArbiter::new(FocusApi::Request);
    let source = focus_source(&config_with(FocusApiPreference::Stream), arbiter.clone());
    assert_eq!(source.api(), FocusApi::Stream);

    let source = focus_source(&config_with(FocusApiPreference::Request), arbiter);
    assert_eq!(source.api(), FocusApi::Request);
}

#[test]
fn test_request_preference_falls_back_to_stream() {
    let arbiter = RecordingArbiter::new(FocusApi::Stream);
    let source = focus_source(&config_with(FocusApiPreference::Request), arbiter);
    assert_eq!(source.api(), FocusApi::Stream);
}

#[test]
fn test_request_focus_usage() {
    let arbiter = RecordingArbiter::new(FocusApi::Request);
    let mut config = SpeechConfig::default();
    config.focus_usage = AudioUsage::AccessibilitySpeech;
    let source = focus_source(&config, arbiter.clone());

    let grant = source.acquire().unwrap();
    assert_eq!(grant.api(), FocusApi::Request);
    assert!(!grant.is_delayed());

    let requests = arbiter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].usage, AudioUsage::AccessibilitySpeech);
    assert!(requests[0].accepts_delayed_gain);

    grant.release();
    assert!(arbiter.balanced());
}

#[test]
fn test_stream_focus_uses_fresh_listener_per_grant() {
    let arbiter = RecordingArbiter::new(FocusApi::Stream);
    let source = focus_source(&SpeechConfig::default(), arbiter.clone());

    let first = source.acquire().unwrap();
    let second = source.acquire().unwrap();
    assert_eq!(first.api(), FocusApi::Stream);

    let listeners = arbiter.stream_requests();
    assert_eq!(listeners.len(), 2);
    assert_ne!(listeners[0], listeners[1]);

    first.release();
    assert_eq!(arbiter.abandoned(), 1);
    assert_eq!(arbiter.outstanding(), 1);
    second.release();
    assert!(arbiter.balanced());
}

#[test]
fn test_grants_release_on_drop() {
    for api in [FocusApi::Request, FocusApi::Stream] {
        let arbiter = RecordingArbiter::new(api);
        let source = focus_source(&SpeechConfig::default(), arbiter.clone());

        {
            let _first = source.acquire().unwrap();
            let _second = source.acquire().unwrap();
            assert_eq!(arbiter.outstanding(), 2);
        }

        assert_eq!(arbiter.outstanding(), 0);
        assert!(arbiter.balanced(), "{:?} grants not balanced", api);
    }
}

#[test]
fn test_denied_focus() {
    for api in [FocusApi::Request, FocusApi::Stream] {
        let arbiter = RecordingArbiter::new(api);
        arbiter.set_outcome(FocusOutcome::Denied);
        let source = focus_source(&SpeechConfig::default(), arbiter.clone());

        assert!(matches!(source.acquire(), Err(SpeechError::FocusDenied)));
        assert_eq!(arbiter.abandoned(), 0);
    }
}

#[test]
fn test_delayed_request_focus() {
    let arbiter = RecordingArbiter::new(FocusApi::Request);
    arbiter.set_outcome(FocusOutcome::Delayed);
    let source = focus_source(&SpeechConfig::default(), arbiter.clone());

    let grant = source.acquire().unwrap();
    assert!(grant.is_delayed());
    drop(grant);
    assert!(arbiter.balanced());

    let mut config = SpeechConfig::default();
    config.accept_delayed_focus = false;
    let source = focus_source(&config, arbiter.clone());
    assert!(matches!(source.acquire(), Err(SpeechError::FocusDenied)));
    assert!(!arbiter.requests()[1].accepts_delayed_gain);
    assert!(arbiter.balanced());
}

#[test]
fn test_delayed_stream_focus_is_denied() {
    let arbiter = RecordingArbiter::new(FocusApi::Stream);
    arbiter.set_outcome(FocusOutcome::Delayed);
    let source = focus_source(&SpeechConfig::default(), arbiter.clone());

    assert!(matches!(source.acquire(), Err(SpeechError::FocusDenied)));
    assert!(arbiter.balanced());
}

#[test]
fn test_unarbitrated_focus_tracks_grants() {
    let arbiter = Arc::new(UnarbitratedFocus::new());
    assert_eq!(arbiter.newest_api(), FocusApi::Request);

    for preference in [FocusApiPreference::Request, FocusApiPreference::Stream] {
        let source = focus_source(&config_with(preference), arbiter.clone());
        let grant = source.acquire().unwrap();
        assert_eq!(arbiter.outstanding(), 1);
        grant.release();
        assert_eq!(arbiter.outstanding(), 0);
    }
}
