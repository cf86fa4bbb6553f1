//! Stateful wrapper around one media element
//!
//! Holds the logical state the orchestrator reasons about. Backend failures
//! are logged here and never change that state's meaning: a channel that
//! failed to start is simply "not playing".

use super::{ChannelName, MediaElement, MediaError};
use crate::session::Completion;
use std::time::Duration;
use tracing::{debug, warn};

/// Snapshot of a channel for observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    pub volume: f32,
    pub playing: bool,
    pub position: Duration,
}

pub struct AudioChannel {
    name: ChannelName,
    looping: bool,
    element: Box<dyn MediaElement>,
    volume: f32,
    playing: bool,
    /// End notification for the next play cycle
    pending_end: Option<Completion>,
}

impl AudioChannel {
    pub fn new(name: ChannelName, element: Box<dyn MediaElement>) -> Self {
        Self {
            name,
            looping: name.loops(),
            element,
            volume: 0.0,
            playing: false,
            pending_end: None,
        }
    }

    pub fn name(&self) -> ChannelName {
        self.name
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> Duration {
        self.element.position()
    }

    pub fn state(&self) -> ChannelState {
        ChannelState {
            volume: self.volume,
            playing: self.playing,
            position: self.position(),
        }
    }

    /// Register the end notification for the next play cycle
    ///
    /// Looping channels never finish, so the registration is dropped.
    pub fn on_finished(&mut self, completion: Completion) {
        if self.looping {
            debug!("{} channel loops; ignoring finish registration", self.name);
            return;
        }
        self.pending_end = Some(completion);
    }

    /// Start playback; returns whether the backend accepted it
    pub fn play(&mut self) -> bool {
        let on_end = self.pending_end.take();
        match self.element.play(on_end) {
            Ok(()) => {
                self.playing = true;
                true
            }
            Err(e) => {
                self.playing = false;
                self.absorb("play", e);
                false
            }
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
        if let Err(e) = self.element.pause() {
            self.absorb("pause", e);
        }
    }

    /// Pause and rewind
    pub fn stop(&mut self) {
        self.pause();
        self.seek_start();
        self.pending_end = None;
    }

    pub fn seek_start(&mut self) {
        if let Err(e) = self.element.seek_start() {
            self.absorb("seek", e);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.volume = volume;
        if let Err(e) = self.element.set_volume(volume) {
            self.absorb("volume", e);
        }
    }

    fn absorb(&self, operation: &str, error: MediaError) {
        warn!("{} channel {} failed: {}", self.name, operation, error);
    }
}

impl std::fmt::Debug for AudioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioChannel")
            .field("name", &self.name)
            .field("volume", &self.volume)
            .field("playing", &self.playing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DetachedElement;
    use crate::session::testing::{MixLog, RecordingElement};
    use crate::session::{EventSink, SessionEvent, SessionToken};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_volume_is_clamped() {
        let mut channel = AudioChannel::new(ChannelName::Background, Box::new(DetachedElement::new(true)));
        channel.set_volume(1.7);
        assert_eq!(channel.volume(), 1.0);
        channel.set_volume(-0.2);
        assert_eq!(channel.volume(), 0.0);
        channel.set_volume(f32::NAN);
        assert_eq!(channel.volume(), 0.0);
    }

    #[test]
    fn test_failed_play_is_absorbed() {
        let log = MixLog::new();
        let mut channel = AudioChannel::new(
            ChannelName::Laugh,
            Box::new(RecordingElement::failing(ChannelName::Laugh, log.clone())),
        );

        assert!(!channel.play());
        assert!(!channel.is_playing());
        // Other operations still go through
        channel.set_volume(0.5);
        assert_eq!(channel.volume(), 0.5);
    }

    #[test]
    fn test_looping_channel_ignores_finish_registration() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let log = MixLog::new();
        let mut channel = AudioChannel::new(
            ChannelName::Chaos,
            Box::new(RecordingElement::new(ChannelName::Chaos, log.clone())),
        );

        channel.on_finished(sink.completion(SessionEvent::LaughEnded {
            token: SessionToken::NONE,
        }));
        assert!(channel.play());
        log.finish_all();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_one_shot_finishes_once_per_cycle() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let log = MixLog::new();
        let mut channel = AudioChannel::new(
            ChannelName::Laugh,
            Box::new(RecordingElement::new(ChannelName::Laugh, log.clone())),
        );
        let token = SessionToken::NONE.next();

        channel.on_finished(sink.completion(SessionEvent::LaughEnded { token }));
        assert!(channel.play());
        log.finish_all();
        log.finish_all();

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::LaughEnded { .. })));
        assert!(rx.try_recv().is_err());

        // A new cycle without a registration finishes silently
        assert!(channel.play());
        log.finish_all();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_drops_pending_registration() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let log = MixLog::new();
        let mut channel = AudioChannel::new(
            ChannelName::Laugh,
            Box::new(RecordingElement::new(ChannelName::Laugh, log.clone())),
        );

        channel.on_finished(sink.completion(SessionEvent::LaughEnded {
            token: SessionToken::NONE,
        }));
        channel.stop();
        assert!(channel.play());
        log.finish_all();

        assert!(rx.try_recv().is_err());
    }
}
