//! Recording doubles for the session's collaborators
//!
//! Shared by unit tests and the integration tests under `tests/`. Every
//! double writes into a cloneable log so a test can inspect what happened
//! and fire the completions a real backend would fire.

use crate::archive::{FetchError, Prophecy, ResultFetcher};
use crate::audio::{ChannelName, MediaElement, MediaError};
use crate::session::{Completion, EventSink, SessionEvent, SessionToken, VolumePolicy};
use crate::speech::{SpeechEngine, Utterance, VoiceInfo};
use crate::sting::StingStage;
use crate::{Result, SeanceError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingChannel {
    volume: f32,
    playing: bool,
    on_end: Option<Completion>,
}

#[derive(Default)]
struct RecordingInner {
    channels: HashMap<ChannelName, RecordingChannel>,
    floor: f32,
    writes: usize,
    violations: Vec<String>,
}

impl RecordingInner {
    fn audible(&self, name: ChannelName) -> bool {
        self.channels
            .get(&name)
            .map(|c| c.playing && c.volume > self.floor)
            .unwrap_or(false)
    }

    fn laugh_playing(&self) -> bool {
        self.channels
            .get(&ChannelName::Laugh)
            .map(|c| c.playing && c.volume > 0.0)
            .unwrap_or(false)
    }

    /// Record a write and check the exclusivity rules after it
    fn record(&mut self, name: ChannelName, what: &str) {
        self.writes += 1;
        let background = self.audible(ChannelName::Background);

        if background && self.audible(ChannelName::Chaos) {
            self.violations
                .push(format!("write {} ({} {}): background and chaos both audible", self.writes, name, what));
        }
        if background && self.laugh_playing() {
            self.violations
                .push(format!("write {} ({} {}): background audible under the laugh", self.writes, name, what));
        }
    }
}

/// Shared log of every media write, with a running exclusivity check
#[derive(Clone)]
pub struct MixLog {
    inner: Arc<Mutex<RecordingInner>>,
}

impl Default for MixLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MixLog {
    pub fn new() -> Self {
        Self::with_floor(VolumePolicy::default().audible_floor())
    }

    pub fn with_floor(floor: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecordingInner {
                floor,
                ..RecordingInner::default()
            })),
        }
    }

    pub fn volume(&self, name: ChannelName) -> f32 {
        self.inner
            .lock()
            .channels
            .get(&name)
            .map(|c| c.volume)
            .unwrap_or(0.0)
    }

    pub fn is_playing(&self, name: ChannelName) -> bool {
        self.inner
            .lock()
            .channels
            .get(&name)
            .map(|c| c.playing)
            .unwrap_or(false)
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn violations(&self) -> Vec<String> {
        self.inner.lock().violations.clone()
    }

    /// Let `name` reach its natural end
    pub fn finish(&self, name: ChannelName) {
        let on_end = {
            let mut inner = self.inner.lock();
            let channel = inner.channels.entry(name).or_default();
            channel.playing = false;
            channel.on_end.take()
        };
        if let Some(on_end) = on_end {
            on_end.fire();
        }
    }

    /// Let every one-shot channel reach its end
    pub fn finish_all(&self) {
        let pending: Vec<ChannelName> = {
            let inner = self.inner.lock();
            inner
                .channels
                .iter()
                .filter(|(_, c)| c.on_end.is_some())
                .map(|(name, _)| *name)
                .collect()
        };
        for name in pending {
            self.finish(name);
        }
    }
}

/// Media element that records into a [`MixLog`]
pub struct RecordingElement {
    name: ChannelName,
    log: MixLog,
    failing: bool,
}

impl RecordingElement {
    pub fn new(name: ChannelName, log: MixLog) -> Self {
        Self {
            name,
            log,
            failing: false,
        }
    }

    /// An element whose `play` is always refused, like a blocked autoplay
    pub fn failing(name: ChannelName, log: MixLog) -> Self {
        Self {
            name,
            log,
            failing: true,
        }
    }

    fn write(&self, what: &str, apply: impl FnOnce(&mut RecordingChannel)) {
        let mut inner = self.log.inner.lock();
        apply(inner.channels.entry(self.name).or_default());
        inner.record(self.name, what);
    }
}

impl MediaElement for RecordingElement {
    fn play(&mut self, on_end: Option<Completion>) -> std::result::Result<(), MediaError> {
        if self.failing {
            return Err(MediaError::Unavailable(format!("{} blocked", self.name)));
        }
        self.write("play", |c| {
            c.playing = true;
            c.on_end = on_end;
        });
        Ok(())
    }

    fn pause(&mut self) -> std::result::Result<(), MediaError> {
        self.write("pause", |c| c.playing = false);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> std::result::Result<(), MediaError> {
        self.write("volume", |c| c.volume = volume);
        Ok(())
    }

    fn seek_start(&mut self) -> std::result::Result<(), MediaError> {
        self.write("seek", |_| {});
        Ok(())
    }

    fn position(&self) -> Duration {
        Duration::ZERO
    }
}

#[derive(Default)]
struct SpeechInner {
    spoken: Vec<Utterance>,
    pending: Option<Completion>,
    cancels: usize,
}

/// What a [`ScriptedSpeech`] engine was asked to do
#[derive(Clone, Default)]
pub struct SpeechLog {
    inner: Arc<Mutex<SpeechInner>>,
}

impl SpeechLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.inner.lock().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.inner.lock().cancels
    }

    /// Report the end of the latest utterance, even if it was cancelled
    pub fn finish_current(&self) {
        let pending = self.inner.lock().pending.take();
        if let Some(on_end) = pending {
            on_end.fire();
        }
    }
}

/// Speech engine that only records
pub struct ScriptedSpeech {
    log: SpeechLog,
    failing: bool,
}

impl ScriptedSpeech {
    pub fn new(log: SpeechLog) -> Self {
        Self { log, failing: false }
    }

    pub fn failing(log: SpeechLog) -> Self {
        Self { log, failing: true }
    }
}

impl SpeechEngine for ScriptedSpeech {
    fn voices(&self) -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Clear Soprano").as_default(),
            VoiceInfo::new("Hollow Baritone"),
        ]
    }

    fn speak(&mut self, utterance: Utterance, on_end: Completion) -> Result<()> {
        if self.failing {
            return Err(SeanceError::TTSError("synthesizer offline".into()));
        }
        let mut inner = self.log.inner.lock();
        inner.spoken.push(utterance);
        inner.pending = Some(on_end);
        Ok(())
    }

    fn cancel(&mut self) {
        self.log.inner.lock().cancels += 1;
    }
}

/// One call on a [`StingStage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCall {
    ShowOverlay,
    StartShake,
    StopShake,
    BeginExit,
    Clear,
}

#[derive(Default)]
struct StageInner {
    calls: Vec<StageCall>,
    overlay: bool,
    shaking: bool,
    exit: Option<Completion>,
}

#[derive(Clone, Default)]
pub struct StageLog {
    inner: Arc<Mutex<StageInner>>,
}

impl StageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StageCall> {
        self.inner.lock().calls.clone()
    }

    pub fn overlay_visible(&self) -> bool {
        self.inner.lock().overlay
    }

    pub fn shaking(&self) -> bool {
        self.inner.lock().shaking
    }

    /// End the running exit animation
    pub fn finish_exit(&self) {
        let exit = self.inner.lock().exit.take();
        if let Some(on_exited) = exit {
            on_exited.fire();
        }
    }
}

/// Sting stage that records calls instead of drawing
pub struct RecordingStage {
    log: StageLog,
}

impl RecordingStage {
    pub fn new(log: StageLog) -> Self {
        Self { log }
    }

    fn call(&self, call: StageCall, apply: impl FnOnce(&mut StageInner)) {
        let mut inner = self.log.inner.lock();
        inner.calls.push(call);
        apply(&mut inner);
    }
}

impl StingStage for RecordingStage {
    fn show_overlay(&mut self) {
        self.call(StageCall::ShowOverlay, |s| s.overlay = true);
    }

    fn start_shake(&mut self) {
        self.call(StageCall::StartShake, |s| s.shaking = true);
    }

    fn stop_shake(&mut self) {
        self.call(StageCall::StopShake, |s| s.shaking = false);
    }

    fn begin_overlay_exit(&mut self, on_exited: Completion) {
        self.call(StageCall::BeginExit, |s| s.exit = Some(on_exited));
    }

    fn clear(&mut self) {
        self.call(StageCall::Clear, |s| {
            s.overlay = false;
            s.shaking = false;
            s.exit = None;
        });
    }
}

#[derive(Default)]
struct FetchInner {
    requests: Vec<(SessionToken, String)>,
    sink: Option<EventSink>,
}

/// Requests seen by a [`ScriptedFetcher`]
#[derive(Clone, Default)]
pub struct FetchLog {
    inner: Arc<Mutex<FetchInner>>,
}

impl FetchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<(SessionToken, String)> {
        self.inner.lock().requests.clone()
    }

    /// Settle the most recent request
    pub fn settle(&self, outcome: std::result::Result<Prophecy, FetchError>) {
        let (token, sink) = {
            let inner = self.inner.lock();
            let token = inner.requests.last().map(|(t, _)| *t);
            (token, inner.sink.clone())
        };
        if let (Some(token), Some(sink)) = (token, sink) {
            sink.emit(SessionEvent::FetchSettled { token, outcome });
        }
    }
}

/// Fetcher that records requests and optionally answers at once
pub struct ScriptedFetcher {
    log: FetchLog,
    reply: Option<std::result::Result<Prophecy, FetchError>>,
}

impl ScriptedFetcher {
    /// Requests stay in flight until [`FetchLog::settle`]
    pub fn manual(log: FetchLog) -> Self {
        Self { log, reply: None }
    }

    /// Every request settles immediately with `reply`
    pub fn replying(log: FetchLog, reply: std::result::Result<Prophecy, FetchError>) -> Self {
        Self {
            log,
            reply: Some(reply),
        }
    }
}

impl ResultFetcher for ScriptedFetcher {
    fn fetch(&self, token: SessionToken, query: &str, sink: EventSink) {
        {
            let mut inner = self.log.inner.lock();
            inner.requests.push((token, query.to_string()));
            inner.sink = Some(sink.clone());
        }
        if let Some(reply) = &self.reply {
            sink.emit(SessionEvent::FetchSettled {
                token,
                outcome: reply.clone(),
            });
        }
    }
}
