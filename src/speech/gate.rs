//! Ordering between speech cancellation and the start of playback
//!
//! Synthesis runs off the session thread, so an utterance can finish
//! synthesizing just as the session cancels it. [`PlaybackGate`] makes
//! "is this still wanted?" and "start playing" one step that `cancel`
//! cannot interleave with.

use crate::audio::{MediaElement, MediaError};
use crate::session::Completion;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of handing synthesized audio to the output
#[derive(Debug)]
pub enum Delivery {
    Started,
    /// Cancelled before playback began; the end is never fired
    Stale,
    /// No samples; the end fired at once
    Empty,
    /// The output refused to play; the end fired at once
    Failed(MediaError),
}

/// Generation counter shared by a speech engine and its synthesis worker
#[derive(Debug, Clone, Default)]
pub struct PlaybackGate {
    generation: Arc<Mutex<u64>>,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new generation, invalidating every earlier one
    pub fn issue(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        *self.generation.lock() == generation
    }

    /// Invalidate outstanding work and silence `output`
    ///
    /// Returns only after any playback start already in progress has
    /// finished, so the pause always lands last.
    pub fn cancel<E: MediaElement + ?Sized>(&self, output: &mut E) {
        let mut generation = self.generation.lock();
        *generation += 1;
        if let Err(e) = output.pause() {
            error!("Failed to stop speech output: {}", e);
        }
    }

    /// Play into `output` if `generation` is still current
    ///
    /// `load` puts the audio into `output` and reports whether there was
    /// anything to load. `on_end` fires immediately when nothing can play.
    pub fn start<E, F>(
        &self,
        generation: u64,
        output: &mut E,
        load: F,
        on_end: Completion,
    ) -> Delivery
    where
        E: MediaElement + ?Sized,
        F: FnOnce(&mut E) -> bool,
    {
        let current = self.generation.lock();
        if *current != generation {
            debug!("Generation {} superseded by {}", generation, *current);
            return Delivery::Stale;
        }

        if !load(&mut *output) {
            debug!("Synthesis produced no audio");
            on_end.fire();
            return Delivery::Empty;
        }

        let fallback = on_end.duplicate();
        match output
            .set_volume(1.0)
            .and_then(|_| output.play(Some(on_end)))
        {
            Ok(()) => Delivery::Started,
            Err(e) => {
                warn!("Failed to play speech: {}", e);
                fallback.fire();
                Delivery::Failed(e)
            }
        }
    }
}
