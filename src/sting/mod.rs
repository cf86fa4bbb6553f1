//! The laugh sting: overlay, screen shake and a one-shot laugh clip
//!
//! Completion is reported once, when the clip ends or the fallback timer
//! expires, whichever comes first. The overlay's exit animation may still
//! be running at that point.

use crate::audio::{AudioChannel, ChannelState};
use crate::session::{schedule, Completion, EventSink, SessionEvent, SessionToken, Timer};
use std::time::Duration;
use tracing::{debug, info};

/// Visual surface the sting draws on
pub trait StingStage: Send {
    fn show_overlay(&mut self);

    fn start_shake(&mut self);

    fn stop_shake(&mut self);

    /// Start fading the overlay out; fire `on_exited` when done
    fn begin_overlay_exit(&mut self, on_exited: Completion);

    /// Remove overlay and shake immediately
    fn clear(&mut self);
}

pub struct LaughSequencer {
    laugh: AudioChannel,
    stage: Box<dyn StingStage>,
    sink: EventSink,
    fallback: Duration,
    fallback_timer: Option<Timer>,
    /// Sting running and not yet completed
    active: Option<SessionToken>,
    /// Completed, overlay exit animation still running
    exiting: Option<SessionToken>,
}

impl LaughSequencer {
    pub fn new(
        laugh: AudioChannel,
        stage: Box<dyn StingStage>,
        sink: EventSink,
        fallback: Duration,
    ) -> Self {
        Self {
            laugh,
            stage,
            sink,
            fallback,
            fallback_timer: None,
            active: None,
            exiting: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn laugh_state(&self) -> ChannelState {
        self.laugh.state()
    }

    /// Start the sting for session `token`
    ///
    /// The fallback timer is armed even when the clip starts, so a clip
    /// that never reports its end still completes.
    pub fn trigger(&mut self, token: SessionToken, volume: f32) {
        self.abort();
        self.active = Some(token);

        self.stage.show_overlay();
        self.stage.start_shake();

        self.laugh.stop();
        self.laugh.set_volume(volume);
        self.laugh
            .on_finished(self.sink.completion(SessionEvent::LaughEnded { token }));
        if !self.laugh.play() {
            debug!("Laugh clip did not start; waiting for the fallback timer");
        }

        self.fallback_timer = schedule(
            self.fallback,
            self.sink.completion(SessionEvent::LaughFallback { token }),
        );
        info!("Sting started for session {}", token);
    }

    /// Finish the sting; returns false if it was not running for `token`
    pub fn complete(&mut self, token: SessionToken) -> bool {
        if self.active != Some(token) {
            return false;
        }
        self.active = None;
        self.disarm_fallback();

        self.laugh.stop();
        self.stage.stop_shake();
        self.exiting = Some(token);
        self.stage
            .begin_overlay_exit(self.sink.completion(SessionEvent::OverlayExited { token }));

        info!("Sting completed for session {}", token);
        true
    }

    /// Exit animation finished
    pub fn overlay_exited(&mut self, token: SessionToken) {
        if self.exiting == Some(token) {
            self.exiting = None;
            self.stage.clear();
        } else {
            debug!("Ignoring overlay exit of session {}", token);
        }
    }

    /// Tear the sting down immediately
    pub fn abort(&mut self) {
        if self.active.is_none() && self.exiting.is_none() {
            return;
        }
        if let Some(token) = self.active.or(self.exiting) {
            debug!("Aborting sting of session {}", token);
        }
        self.active = None;
        self.exiting = None;
        self.disarm_fallback();
        self.laugh.stop();
        self.stage.stop_shake();
        self.stage.clear();
    }

    fn disarm_fallback(&mut self) {
        if let Some(timer) = self.fallback_timer.take() {
            timer.cancel();
        }
    }
}

impl std::fmt::Debug for LaughSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaughSequencer")
            .field("active", &self.active)
            .field("exiting", &self.exiting)
            .field("fallback_armed", &self.fallback_timer.is_some())
            .field("laugh", &self.laugh)
            .finish()
    }
}
