use super::{MediaElement, MediaError};
use crate::session::Completion;
use std::time::{Duration, Instant};

/// Media element with no device behind it
///
/// Looping sources "play" in silence so the state machine sees the same
/// volumes it would with sound. One-shot sources refuse to start, which
/// leaves their callers on the bounded fallback path.
#[derive(Debug)]
pub struct DetachedElement {
    looping: bool,
    volume: f32,
    started: Option<Instant>,
    elapsed: Duration,
}

impl DetachedElement {
    pub fn new(looping: bool) -> Self {
        Self {
            looping,
            volume: 0.0,
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl MediaElement for DetachedElement {
    fn play(&mut self, _on_end: Option<Completion>) -> Result<(), MediaError> {
        if !self.looping {
            return Err(MediaError::Unavailable("no audio output device".into()));
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), MediaError> {
        self.volume = volume;
        Ok(())
    }

    fn seek_start(&mut self) -> Result<(), MediaError> {
        self.elapsed = Duration::ZERO;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.elapsed + self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}
