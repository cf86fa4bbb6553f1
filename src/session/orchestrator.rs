//! The session state machine
//!
//! [`SessionOrchestrator::handle`] is the single transition function. It is
//! called only from the session loop, one event at a time, so every stage
//! change and every channel write happens in a well-defined order.
//!
//! Write ordering keeps background exclusive: whatever is audible is
//! silenced before the next source is raised, and exactly one target
//! volume is restored on the way out.

use super::events::{EventSink, SessionEvent, SessionToken};
use super::policy::VolumePolicy;
use super::state::{PlaybackSession, SessionNotice, SessionState, SessionView};
use crate::archive::{FetchError, Prophecy, ResultFetcher};
use crate::audio::AudioChannel;
use crate::integration::{SeanceConfig, SpeechConfig};
use crate::speech::{SpeechEngine, SpeechNarrator, SpeechRequest};
use crate::sting::{LaughSequencer, StingStage};
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

/// Injected collaborators of a session
pub struct SessionParts {
    pub background: AudioChannel,
    pub chaos: AudioChannel,
    pub laugh: AudioChannel,
    /// `None` when the host cannot speak
    pub speech: Option<Box<dyn SpeechEngine>>,
    pub stage: Box<dyn StingStage>,
    pub fetcher: Box<dyn ResultFetcher>,
}

/// Whether the session loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct SessionOrchestrator {
    policy: VolumePolicy,
    speech: SpeechConfig,
    background: AudioChannel,
    chaos: AudioChannel,
    narrator: SpeechNarrator,
    sting: LaughSequencer,
    fetcher: Box<dyn ResultFetcher>,
    sink: EventSink,
    notices: Sender<SessionNotice>,

    /// Token of the newest session
    token: SessionToken,
    session: Option<PlaybackSession>,
    /// A user interaction has happened; background may play
    unlocked: bool,
    loading: bool,
    controls_disabled: bool,
}

impl SessionOrchestrator {
    pub fn new(
        parts: SessionParts,
        config: &SeanceConfig,
        sink: EventSink,
        notices: Sender<SessionNotice>,
    ) -> Self {
        let narrator = SpeechNarrator::new(parts.speech, sink.clone(), config.speech.bounds);
        let sting = LaughSequencer::new(
            parts.laugh,
            parts.stage,
            sink.clone(),
            config.sting.fallback,
        );

        Self {
            policy: config.volumes.clone(),
            speech: config.speech.clone(),
            background: parts.background,
            chaos: parts.chaos,
            narrator,
            sting,
            fetcher: parts.fetcher,
            sink,
            notices,
            token: SessionToken::NONE,
            session: None,
            unlocked: false,
            loading: false,
            controls_disabled: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state(),
            loading: self.loading,
            result: self.session.as_ref().and_then(|s| s.result.clone()),
            error: self.session.as_ref().and_then(|s| s.error.clone()),
            controls_disabled: self.controls_disabled,
            background_volume: self.audible_volume(&self.background),
            chaos_volume: self.audible_volume(&self.chaos),
            sting_active: self.sting.is_active(),
            token: self.token,
            query: self.session.as_ref().map(|s| s.query.clone()),
        }
    }

    fn audible_volume(&self, channel: &AudioChannel) -> f32 {
        if channel.is_playing() {
            channel.volume()
        } else {
            0.0
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Submit(query) => self.submit(&query),
            SessionEvent::Reset => self.reset(),
            SessionEvent::AmbientUnlock => self.ambient_unlock(),
            SessionEvent::FetchSettled { token, outcome } => {
                if self.is_live(token, SessionState::WaitingForResult) {
                    match outcome {
                        Ok(prophecy) => self.narrate(prophecy),
                        Err(error) => self.fail(error),
                    }
                } else {
                    debug!("Ignoring stale fetch result for session {}", token);
                }
            }
            SessionEvent::NarrationEnded { token, utterance } => {
                if self.is_live(token, SessionState::Narrating)
                    && self.narrator.accept_end(token, utterance)
                {
                    self.laugh();
                } else {
                    debug!("Ignoring narration end {} of session {}", utterance, token);
                }
            }
            SessionEvent::LaughEnded { token } | SessionEvent::LaughFallback { token } => {
                if self.is_live(token, SessionState::Laughing) && self.sting.complete(token) {
                    self.resume();
                } else {
                    debug!("Ignoring sting completion of session {}", token);
                }
            }
            SessionEvent::OverlayExited { token } => self.sting.overlay_exited(token),
            SessionEvent::Shutdown => {
                info!("Session loop shutting down");
                self.teardown();
                self.background.stop();
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn is_live(&self, token: SessionToken, state: SessionState) -> bool {
        token == self.token && self.state() == state
    }

    fn submit(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring empty submission");
            return;
        }

        // A submit is a user interaction
        self.unlocked = true;

        if self.state().is_active() {
            self.supersede();
        }

        self.token = self.token.next();
        let token = self.token;
        self.session = Some(PlaybackSession::new(token, query));
        info!("Session {} started: {:?}", token, query);

        self.enter(SessionState::Submitting);
        self.narrator.cancel();
        self.sting.abort();
        self.background.pause();
        self.chaos.seek_start();
        self.chaos.set_volume(self.policy.chaos);
        self.chaos.play();
        self.loading = true;
        self.controls_disabled = true;
        self.publish();

        self.enter(SessionState::WaitingForResult);
        self.fetcher.fetch(token, query, self.sink.clone());
        self.publish();
    }

    fn narrate(&mut self, prophecy: Prophecy) {
        let interpretation = prophecy.interpretation.clone();
        if let Some(session) = self.session.as_mut() {
            session.result = Some(prophecy);
        }

        self.enter(SessionState::Narrating);
        self.chaos.stop();
        self.background.set_volume(self.policy.ducked);
        self.background.play();
        let request = SpeechRequest::from_config(interpretation, &self.speech);
        self.narrator.speak(self.token, request);
        self.publish();
    }

    fn laugh(&mut self) {
        self.enter(SessionState::Laughing);
        self.background.pause();
        self.sting.trigger(self.token, self.policy.laugh);
        self.publish();
    }

    fn resume(&mut self) {
        self.enter(SessionState::Resuming);
        self.restore_background();
        self.loading = false;
        self.controls_disabled = false;
        self.publish();

        self.enter(SessionState::Idle);
        self.publish();
        info!("Session {} finished", self.token);
    }

    fn fail(&mut self, error: FetchError) {
        warn!("Session {} failed: {}", self.token, error);
        if let Some(session) = self.session.as_mut() {
            session.error = Some(error.user_message());
        }

        self.enter(SessionState::Errored);
        self.teardown();
        self.restore_background();
        self.loading = false;
        self.controls_disabled = false;
        self.publish();

        self.enter(SessionState::Idle);
        self.publish();
    }

    /// Abrupt cancel of the live session for a newer submission
    fn supersede(&mut self) {
        let token = self.token;
        info!("Session {} superseded in state {}", token, self.state());
        self.teardown();
        self.notify(SessionNotice::Superseded { token });
    }

    fn reset(&mut self) {
        if self.state().is_active() {
            info!("Session {} reset in state {}", self.token, self.state());
            self.teardown();
            self.enter(SessionState::Idle);
        }
        self.session = None;
        self.loading = false;
        self.controls_disabled = false;
        if self.unlocked {
            self.restore_background();
        }
        self.publish();
    }

    /// Best-effort background start on first interaction; Idle only
    fn ambient_unlock(&mut self) {
        if self.state().is_active() {
            debug!("Ambient start ignored during session {}", self.token);
            return;
        }
        self.unlocked = true;
        if !self.background.is_playing() {
            self.restore_background();
            self.publish();
        }
    }

    /// Cancel speech, stop the sting and the chaos loop
    fn teardown(&mut self) {
        self.narrator.cancel();
        self.sting.abort();
        self.chaos.stop();
    }

    fn restore_background(&mut self) {
        self.background.set_volume(self.policy.rest);
        self.background.play();
    }

    fn enter(&mut self, to: SessionState) {
        let token = self.token;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let from = session.state;
        session.state = to;
        debug!("Session {}: {} -> {}", token, from, to);
        self.notify(SessionNotice::Transition { token, from, to });
    }

    fn publish(&self) {
        self.notify(SessionNotice::View(self.view()));
    }

    fn notify(&self, notice: SessionNotice) {
        // Nobody listening is fine
        let _ = self.notices.send(notice);
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("token", &self.token)
            .field("state", &self.state())
            .field("unlocked", &self.unlocked)
            .field("loading", &self.loading)
            .finish()
    }
}
