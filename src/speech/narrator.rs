//! Narration of prophecies with exactly one accepted end per request

use super::engine::{select_voice, SpeechEngine, Utterance};
use super::markup::sanitize_markup;
use crate::integration::SpeechConfig;
use crate::session::{schedule, EventSink, SessionEvent, SessionToken, Timer};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on how long one narration may hold the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationBounds {
    /// Allowance per word at rate 1.0
    pub per_word: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Default for NarrationBounds {
    fn default() -> Self {
        Self {
            per_word: Duration::from_millis(600),
            min: Duration::from_secs(3),
            max: Duration::from_secs(90),
        }
    }
}

impl NarrationBounds {
    /// Watchdog delay for `text` spoken at `rate`
    pub fn limit(&self, text: &str, rate: f32) -> Duration {
        let words = text.split_whitespace().count() as u32;
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        let estimate = (self.per_word * words).div_f32(rate);
        estimate.max(self.min).min(self.max)
    }
}

/// What to narrate and how
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    /// Soft preference; the default voice is used when nothing matches
    pub voice_hint: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 0.6,
            pitch: 0.7,
            voice_hint: None,
        }
    }

    pub fn from_config(text: impl Into<String>, config: &SpeechConfig) -> Self {
        Self {
            text: text.into(),
            rate: config.rate,
            pitch: config.pitch,
            voice_hint: config.voice_hint.clone(),
        }
    }

    pub fn with_voice_hint(mut self, hint: impl Into<String>) -> Self {
        self.voice_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    token: SessionToken,
    utterance: u64,
}

pub struct SpeechNarrator {
    engine: Option<Box<dyn SpeechEngine>>,
    sink: EventSink,
    bounds: NarrationBounds,
    outstanding: Option<Outstanding>,
    watchdog: Option<Timer>,
    next_utterance: u64,
}

impl SpeechNarrator {
    /// Narrator over `engine`; `None` means the host cannot speak
    pub fn new(
        engine: Option<Box<dyn SpeechEngine>>,
        sink: EventSink,
        bounds: NarrationBounds,
    ) -> Self {
        Self {
            engine,
            sink,
            bounds,
            outstanding: None,
            watchdog: None,
            next_utterance: 0,
        }
    }

    pub fn has_capability(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Narrate `request` for session `token`
    ///
    /// Any earlier outstanding narration is cancelled first. The returned
    /// id identifies the `NarrationEnded` event that will be accepted.
    pub fn speak(&mut self, token: SessionToken, request: SpeechRequest) -> u64 {
        self.cancel();

        self.next_utterance += 1;
        let utterance = self.next_utterance;
        self.outstanding = Some(Outstanding { token, utterance });
        let end = SessionEvent::NarrationEnded { token, utterance };

        let text = sanitize_markup(&request.text);

        let Some(engine) = self.engine.as_mut() else {
            debug!("No speech capability; narration {} for session {} ends now", utterance, token);
            self.sink.emit(end);
            return utterance;
        };

        if text.is_empty() {
            debug!("Nothing to narrate for session {}", token);
            self.sink.emit(end);
            return utterance;
        }

        let voice = select_voice(&engine.voices(), request.voice_hint.as_deref());
        info!(
            "Narrating {} words for session {} (voice: {})",
            text.split_whitespace().count(),
            token,
            voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default")
        );

        let watchdog = self.bounds.limit(&text, request.rate);
        let spoken = engine.speak(
            Utterance {
                id: utterance,
                text,
                rate: request.rate,
                pitch: request.pitch,
                voice,
            },
            self.sink.completion(end.clone()),
        );

        match spoken {
            Ok(()) => self.watchdog = schedule(watchdog, self.sink.completion(end)),
            Err(e) => {
                warn!("Speech engine failed, skipping narration: {}", e);
                self.sink.emit(end);
            }
        }

        utterance
    }

    /// Stop the outstanding narration; its end will be rejected
    pub fn cancel(&mut self) {
        self.disarm_watchdog();
        let Some(outstanding) = self.outstanding.take() else {
            return;
        };
        debug!(
            "Cancelling narration {} of session {}",
            outstanding.utterance, outstanding.token
        );
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
    }

    /// Whether an end notification belongs to the outstanding narration
    ///
    /// Accepts at most once; watchdog and late engine ends are rejected.
    pub fn accept_end(&mut self, token: SessionToken, utterance: u64) -> bool {
        let expected = Outstanding { token, utterance };
        if self.outstanding == Some(expected) {
            self.outstanding = None;
            self.disarm_watchdog();
            true
        } else {
            false
        }
    }

    fn disarm_watchdog(&mut self) {
        if let Some(timer) = self.watchdog.take() {
            timer.cancel();
        }
    }
}

impl std::fmt::Debug for SpeechNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechNarrator")
            .field("capability", &self.has_capability())
            .field("outstanding", &self.outstanding)
            .field("watchdog", &self.watchdog.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{ScriptedSpeech, SpeechLog};
    use crossbeam_channel::{unbounded, Receiver};

    fn narrator(engine: Option<ScriptedSpeech>) -> (SpeechNarrator, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        let engine = engine.map(|e| Box::new(e) as Box<dyn SpeechEngine>);
        (
            SpeechNarrator::new(engine, EventSink::new(tx), NarrationBounds::default()),
            rx,
        )
    }

    fn expect_end(rx: &Receiver<SessionEvent>) -> (SessionToken, u64) {
        match rx.try_recv() {
            Ok(SessionEvent::NarrationEnded { token, utterance }) => (token, utterance),
            other => panic!("expected NarrationEnded, got {:?}", other),
        }
    }

    #[test]
    fn test_bounds_limit() {
        let bounds = NarrationBounds::default();
        assert_eq!(bounds.limit("", 1.0), bounds.min);
        let long = "word ".repeat(1000);
        assert_eq!(bounds.limit(&long, 0.6), bounds.max);
        // 10 words at rate 0.5 -> 12s
        let ten = "a b c d e f g h i j";
        assert_eq!(bounds.limit(ten, 0.5), Duration::from_secs(12));
        assert_eq!(bounds.limit(ten, 0.0), Duration::from_secs(6));
    }

    #[test]
    fn test_request_defaults() {
        let request = SpeechRequest::new("The gopher burrows");
        assert!((request.rate - 0.6).abs() < f32::EPSILON);
        assert!((request.pitch - 0.7).abs() < f32::EPSILON);
        assert!(request.voice_hint.is_none());
    }

    #[test]
    fn test_no_capability_ends_on_next_tick() {
        let (mut narrator, rx) = narrator(None);
        let token = SessionToken::NONE.next();

        let id = narrator.speak(token, SpeechRequest::new("The gopher burrows..."));
        assert_eq!(expect_end(&rx), (token, id));
        assert!(narrator.accept_end(token, id));
        assert!(!narrator.accept_end(token, id));
    }

    #[test]
    fn test_text_is_sanitized_and_voice_selected() {
        let log = SpeechLog::new();
        let (mut narrator, _rx) = narrator(Some(ScriptedSpeech::new(log.clone())));

        narrator.speak(
            SessionToken::NONE.next(),
            SpeechRequest::new("**The** _gopher_ ## burrows").with_voice_hint("hollow"),
        );

        let spoken = log.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "The gopher burrows");
        assert_eq!(spoken[0].voice.as_ref().unwrap().name, "Hollow Baritone");
    }

    #[test]
    fn test_cancel_is_idempotent_and_suppresses_end() {
        let log = SpeechLog::new();
        let (mut narrator, rx) = narrator(Some(ScriptedSpeech::new(log.clone())));
        let token = SessionToken::NONE.next();

        let id = narrator.speak(token, SpeechRequest::new("The gopher burrows"));
        narrator.cancel();
        narrator.cancel();
        assert_eq!(log.cancels(), 1);

        // An engine that still reports the end is ignored
        log.finish_current();
        let (late_token, late_id) = expect_end(&rx);
        assert_eq!((late_token, late_id), (token, id));
        assert!(!narrator.accept_end(late_token, late_id));
    }

    #[test]
    fn test_cancel_disarms_watchdog() {
        let log = SpeechLog::new();
        let (tx, rx) = unbounded();
        let bounds = NarrationBounds {
            per_word: Duration::from_millis(1),
            min: Duration::from_millis(20),
            max: Duration::from_millis(20),
        };
        let mut narrator = SpeechNarrator::new(
            Some(Box::new(ScriptedSpeech::new(log.clone()))),
            EventSink::new(tx),
            bounds,
        );

        narrator.speak(SessionToken::NONE.next(), SpeechRequest::new("The gopher burrows"));
        narrator.cancel();

        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn test_watchdog_ends_silent_engine() {
        let log = SpeechLog::new();
        let (tx, rx) = unbounded();
        let bounds = NarrationBounds {
            per_word: Duration::from_millis(1),
            min: Duration::from_millis(20),
            max: Duration::from_millis(20),
        };
        let mut narrator = SpeechNarrator::new(
            Some(Box::new(ScriptedSpeech::new(log.clone()))),
            EventSink::new(tx),
            bounds,
        );
        let token = SessionToken::NONE.next();

        let id = narrator.speak(token, SpeechRequest::new("The gopher burrows"));
        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(SessionEvent::NarrationEnded { token: t, utterance }) => {
                assert!(narrator.accept_end(t, utterance));
                assert_eq!(utterance, id);
            }
            other => panic!("expected watchdog end, got {:?}", other),
        }
    }

    #[test]
    fn test_new_speak_cancels_previous() {
        let log = SpeechLog::new();
        let (mut narrator, _rx) = narrator(Some(ScriptedSpeech::new(log.clone())));
        let first = SessionToken::NONE.next();
        let second = first.next();

        let old = narrator.speak(first, SpeechRequest::new("first omen"));
        let new = narrator.speak(second, SpeechRequest::new("second omen"));

        assert_eq!(log.cancels(), 1);
        assert!(!narrator.accept_end(first, old));
        assert!(narrator.accept_end(second, new));
    }

    #[test]
    fn test_engine_failure_degrades_to_instant_end() {
        let log = SpeechLog::new();
        let (mut narrator, rx) = narrator(Some(ScriptedSpeech::failing(log.clone())));
        let token = SessionToken::NONE.next();

        let id = narrator.speak(token, SpeechRequest::new("The gopher burrows"));
        assert_eq!(expect_end(&rx), (token, id));
        assert!(narrator.accept_end(token, id));
    }

    #[test]
    fn test_empty_text_ends_immediately() {
        let log = SpeechLog::new();
        let (mut narrator, rx) = narrator(Some(ScriptedSpeech::new(log.clone())));

        narrator.speak(SessionToken::NONE.next(), SpeechRequest::new("***"));
        assert!(log.spoken().is_empty());
        expect_end(&rx);
    }
}
