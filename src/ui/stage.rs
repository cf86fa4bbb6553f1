//! Sting stage drawn by the UI
//!
//! The session loop drives [`OverlayStage`] through [`StingStage`]; the UI
//! reads the same shared state every frame to draw the overlay and shake.

use crate::session::{schedule, Completion};
use crate::sting::StingStage;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum shake displacement in points
const SHAKE_AMPLITUDE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPhase {
    Hidden,
    Shown,
    Exiting { started: Instant },
}

#[derive(Debug, Clone, Copy)]
struct StageInner {
    phase: OverlayPhase,
    shake_started: Option<Instant>,
}

#[derive(Clone)]
pub struct OverlayStage {
    inner: Arc<Mutex<StageInner>>,
    exit_animation: Duration,
}

impl OverlayStage {
    pub fn new(exit_animation: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StageInner {
                phase: OverlayPhase::Hidden,
                shake_started: None,
            })),
            exit_animation,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.inner.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        let inner = self.inner.lock();
        inner.phase != OverlayPhase::Hidden || inner.shake_started.is_some()
    }

    /// Overlay opacity at `now`, fading out during the exit animation
    pub fn overlay_alpha(&self, now: Instant) -> f32 {
        match self.phase() {
            OverlayPhase::Hidden => 0.0,
            OverlayPhase::Shown => 1.0,
            OverlayPhase::Exiting { started } => {
                if self.exit_animation.is_zero() {
                    return 0.0;
                }
                let t = now.saturating_duration_since(started).as_secs_f32()
                    / self.exit_animation.as_secs_f32();
                (1.0 - t).clamp(0.0, 1.0)
            }
        }
    }

    /// Displacement of the shaken frame at `now`
    pub fn shake_offset(&self, now: Instant) -> egui::Vec2 {
        let Some(started) = self.inner.lock().shake_started else {
            return egui::Vec2::ZERO;
        };
        let t = now.saturating_duration_since(started).as_secs_f32();
        egui::vec2(
            (t * 47.0).sin() * SHAKE_AMPLITUDE,
            (t * 31.0).cos() * SHAKE_AMPLITUDE * 0.5,
        )
    }
}

impl StingStage for OverlayStage {
    fn show_overlay(&mut self) {
        self.inner.lock().phase = OverlayPhase::Shown;
    }

    fn start_shake(&mut self) {
        self.inner.lock().shake_started = Some(Instant::now());
    }

    fn stop_shake(&mut self) {
        self.inner.lock().shake_started = None;
    }

    fn begin_overlay_exit(&mut self, on_exited: Completion) {
        self.inner.lock().phase = OverlayPhase::Exiting {
            started: Instant::now(),
        };
        schedule(self.exit_animation, on_exited);
    }

    fn clear(&mut self) {
        let mut inner = self.inner.lock();
        inner.phase = OverlayPhase::Hidden;
        inner.shake_started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{EventSink, SessionEvent, SessionToken};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_overlay_fades_during_exit() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let mut stage = OverlayStage::new(Duration::from_millis(20));
        let token = SessionToken::NONE.next();

        stage.show_overlay();
        assert_eq!(stage.overlay_alpha(Instant::now()), 1.0);

        stage.begin_overlay_exit(sink.completion(SessionEvent::OverlayExited { token }));
        let later = Instant::now() + Duration::from_millis(40);
        assert_eq!(stage.overlay_alpha(later), 0.0);

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, SessionEvent::OverlayExited { .. }));

        stage.clear();
        assert!(!stage.is_busy());
    }

    #[test]
    fn test_shake_only_while_shaking() {
        let mut stage = OverlayStage::new(Duration::from_millis(600));
        assert_eq!(stage.shake_offset(Instant::now()), egui::Vec2::ZERO);

        stage.start_shake();
        let offset = stage.shake_offset(Instant::now() + Duration::from_millis(13));
        assert!(offset.x.abs() <= SHAKE_AMPLITUDE);

        stage.stop_shake();
        assert_eq!(stage.shake_offset(Instant::now()), egui::Vec2::ZERO);
    }
}
