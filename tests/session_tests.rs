//! End-to-end tests of the session loop
//!
//! These run the real session thread with recording doubles behind every
//! channel, so the full event flow (fetch, narration, sting, fallback
//! timers) is exercised across threads.

use crossbeam_channel::Receiver;
use seance::archive::{FetchError, Prophecy, ResultFetcher};
use seance::audio::{AudioChannel, ChannelName};
use seance::integration::{build_runtime, SeanceConfig};
use seance::session::testing::{
    FetchLog, MixLog, RecordingElement, RecordingStage, ScriptedFetcher, ScriptedSpeech, SpeechLog,
    StageLog,
};
use seance::session::{
    SessionHandle, SessionNotice, SessionParts, SessionRuntime, SessionState, SessionToken,
    SessionView,
};
use seance::speech::SpeechEngine;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn prophecy() -> Prophecy {
    Prophecy::new(
        "0x47 0x4F 0x50 0x48 0x45 0x52",
        "The gopher burrows beneath the old net...",
    )
}

fn config() -> SeanceConfig {
    let mut config = SeanceConfig::default().without_audio_output();
    config.sting.fallback = Duration::from_millis(50);
    config
}

/// A running session loop plus the logs of its doubles
struct Harness {
    handle: SessionHandle,
    notices: Receiver<SessionNotice>,
    thread: Option<JoinHandle<()>>,
    mix: MixLog,
    speech: SpeechLog,
    stage: StageLog,
    fetch: FetchLog,
    transitions: Vec<(SessionToken, SessionState)>,
}

impl Harness {
    fn start(with_speech: bool, reply: Option<Result<Prophecy, FetchError>>) -> Self {
        let mix = MixLog::new();
        let speech = SpeechLog::new();
        let stage = StageLog::new();
        let fetch = FetchLog::new();

        let channel =
            |name| AudioChannel::new(name, Box::new(RecordingElement::new(name, mix.clone())));
        let fetcher: Box<dyn ResultFetcher> = match reply {
            Some(reply) => Box::new(ScriptedFetcher::replying(fetch.clone(), reply)),
            None => Box::new(ScriptedFetcher::manual(fetch.clone())),
        };

        let parts = SessionParts {
            background: channel(ChannelName::Background),
            chaos: channel(ChannelName::Chaos),
            laugh: channel(ChannelName::Laugh),
            speech: with_speech
                .then(|| Box::new(ScriptedSpeech::new(speech.clone())) as Box<dyn SpeechEngine>),
            stage: Box::new(RecordingStage::new(stage.clone())),
            fetcher,
        };

        let (runtime, handle) = SessionRuntime::new(parts, &config());
        let notices = handle.notice_receiver();
        let thread = runtime.start().unwrap();

        Self {
            handle,
            notices,
            thread: Some(thread),
            mix,
            speech,
            stage,
            fetch,
            transitions: Vec::new(),
        }
    }

    /// Consume notices until a view satisfies `done`
    fn wait_until(&mut self, done: impl Fn(&SessionView) -> bool) -> SessionView {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.notices.recv_timeout(remaining) {
                Ok(SessionNotice::Transition { token, to, .. }) => {
                    self.transitions.push((token, to))
                }
                Ok(SessionNotice::View(view)) if done(&view) => return view,
                Ok(_) => {}
                Err(_) => panic!("timed out; transitions so far: {:?}", self.transitions),
            }
        }
    }

    fn wait_for_state(&mut self, token: u64, state: SessionState) -> SessionView {
        self.wait_until(|v| v.token.value() == token && v.state == state)
    }

    fn states_of(&self, token: u64) -> Vec<SessionState> {
        self.transitions
            .iter()
            .filter(|(t, _)| t.value() == token)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[test]
fn test_successful_session_walks_every_stage() {
    let mut h = Harness::start(true, Some(Ok(prophecy())));
    h.handle.ambient_unlock().unwrap();
    h.handle.submit("what is gopher").unwrap();

    let narrating = h.wait_for_state(1, SessionState::Narrating);
    assert_eq!(narrating.background_volume, 0.1);
    assert_eq!(narrating.chaos_volume, 0.0);
    assert_eq!(h.speech.spoken()[0].text, prophecy().interpretation);

    h.speech.finish_current();
    // The laugh clip never ends on its own here; the fallback completes it
    let idle = h.wait_for_state(1, SessionState::Idle);

    assert_eq!(idle.result, Some(prophecy()));
    assert!(idle.error.is_none());
    assert!(!idle.loading);
    assert!(!idle.controls_disabled);
    assert_eq!(idle.background_volume, 0.3);
    assert_eq!(
        h.states_of(1),
        vec![
            SessionState::Submitting,
            SessionState::WaitingForResult,
            SessionState::Narrating,
            SessionState::Laughing,
            SessionState::Resuming,
            SessionState::Idle,
        ]
    );
    assert!(!h.stage.shaking());
    assert!(h.mix.violations().is_empty(), "{:?}", h.mix.violations());
}

#[test]
fn test_network_failure_restores_background() {
    let mut h = Harness::start(
        true,
        Some(Err(FetchError::Transport("connection refused".into()))),
    );
    h.handle.submit("x").unwrap();

    let idle = h.wait_for_state(1, SessionState::Idle);
    assert!(idle.result.is_none());
    assert!(!idle.error.unwrap().is_empty());
    assert_eq!(idle.background_volume, 0.3);
    assert_eq!(idle.chaos_volume, 0.0);
    assert!(h.speech.spoken().is_empty());
    assert!(h.states_of(1).ends_with(&[SessionState::Errored, SessionState::Idle]));
    assert!(h.mix.violations().is_empty());
}

#[test]
fn test_malformed_reply_is_a_failure() {
    let mut h = Harness::start(
        false,
        Some(Err(FetchError::Content("missing interpretation".into()))),
    );
    h.handle.submit("what is gopher").unwrap();

    let idle = h.wait_for_state(1, SessionState::Idle);
    assert!(idle.error.is_some());
    assert!(!h.states_of(1).contains(&SessionState::Narrating));
}

#[test]
fn test_resubmit_during_narration_cancels_cleanly() {
    let mut h = Harness::start(true, None);
    h.handle.submit("first").unwrap();
    h.wait_for_state(1, SessionState::WaitingForResult);
    h.fetch.settle(Ok(prophecy()));
    h.wait_for_state(1, SessionState::Narrating);

    h.handle.submit("second").unwrap();
    h.wait_for_state(2, SessionState::WaitingForResult);
    assert_eq!(h.speech.cancels(), 1);
    assert_eq!(h.states_of(2)[0], SessionState::Submitting);

    // The abandoned utterance reports its end late
    h.speech.finish_current();
    h.fetch.settle(Ok(Prophecy::new("0x00", "A second reading")));
    h.wait_for_state(2, SessionState::Narrating);
    assert!(!h.stage.overlay_visible());

    h.speech.finish_current();
    h.wait_for_state(2, SessionState::Idle);

    assert!(!h.states_of(1).contains(&SessionState::Laughing));
    assert_eq!(
        h.states_of(2)
            .iter()
            .filter(|s| **s == SessionState::Laughing)
            .count(),
        1
    );
    assert_eq!(h.fetch.requests().len(), 2);
    assert!(h.mix.violations().is_empty());
}

#[test]
fn test_without_speech_narration_is_immediate() {
    let mut h = Harness::start(false, Some(Ok(prophecy())));
    let started = Instant::now();
    h.handle.submit("what is gopher").unwrap();

    h.wait_for_state(1, SessionState::Laughing);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(h.states_of(1).contains(&SessionState::Narrating));

    h.wait_for_state(1, SessionState::Idle);
}

#[test]
fn test_laugh_end_and_fallback_complete_once() {
    let mut h = Harness::start(false, Some(Ok(prophecy())));
    h.handle.submit("what is gopher").unwrap();
    h.wait_for_state(1, SessionState::Laughing);

    h.mix.finish(ChannelName::Laugh);
    h.wait_for_state(1, SessionState::Idle);

    // A fallback firing now would land in an idle session
    std::thread::sleep(Duration::from_millis(120));
    h.handle.reset().unwrap();
    h.wait_until(|v| v.result.is_none());

    assert_eq!(
        h.states_of(1)
            .iter()
            .filter(|s| **s == SessionState::Resuming)
            .count(),
        1
    );
}

#[test]
fn test_failing_media_never_blocks() {
    let mix = MixLog::new();
    let fetch = FetchLog::new();
    let failing = |name| AudioChannel::new(name, Box::new(RecordingElement::failing(name, mix.clone())));
    let parts = SessionParts {
        background: failing(ChannelName::Background),
        chaos: failing(ChannelName::Chaos),
        laugh: failing(ChannelName::Laugh),
        speech: Some(Box::new(ScriptedSpeech::failing(SpeechLog::new()))),
        stage: Box::new(RecordingStage::new(StageLog::new())),
        fetcher: Box::new(ScriptedFetcher::replying(fetch, Ok(prophecy()))),
    };

    let (runtime, handle) = SessionRuntime::new(parts, &config());
    let notices = handle.notice_receiver();
    let thread = runtime.start().unwrap();
    handle.submit("what is gopher").unwrap();

    let deadline = Instant::now() + WAIT;
    let idle = loop {
        match notices.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(SessionNotice::View(v)) if v.state == SessionState::Idle && v.token.value() == 1 => {
                break v
            }
            Ok(_) => {}
            Err(_) => panic!("session never returned to idle"),
        }
    };

    assert_eq!(idle.result, Some(prophecy()));
    assert!(idle.error.is_none());

    handle.shutdown().unwrap();
    thread.join().unwrap();
}

#[test]
fn test_unreachable_archive_reports_error() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let mut config = config().with_archive_url("http://127.0.0.1:9");
    config.archive.timeout = Duration::from_secs(2);

    let (runtime, handle, _guard, _client) = build_runtime(
        &config,
        Box::new(RecordingStage::new(StageLog::new())),
        rt.handle().clone(),
    )
    .unwrap();
    let notices = handle.notice_receiver();
    let thread = runtime.start().unwrap();

    handle.submit("what is gopher").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let idle = loop {
        match notices.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(SessionNotice::View(v)) if v.state == SessionState::Idle && v.token.value() == 1 => {
                break v
            }
            Ok(_) => {}
            Err(_) => panic!("fetch never settled"),
        }
    };

    assert!(idle.result.is_none());
    assert!(!idle.error.unwrap().is_empty());

    handle.shutdown().unwrap();
    thread.join().unwrap();
}
