//! Named audio channels and the media primitives behind them
//!
//! The session loop only sees [`AudioChannel`]s. Each wraps a boxed
//! [`MediaElement`]: a mixer voice on a real output device, or a
//! [`DetachedElement`] when there is none.

pub mod channel;
pub mod clip;
pub mod detached;
#[cfg(feature = "audio-io")]
pub mod mixer;
pub mod resampler;

pub use channel::{AudioChannel, ChannelState};
pub use clip::{load_clip, Clip};
pub use detached::DetachedElement;
#[cfg(feature = "audio-io")]
pub use mixer::{Mixer, MixerVoice};

use crate::session::Completion;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stable logical names of the playable sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    Background,
    Chaos,
    Laugh,
    Speech,
}

impl ChannelName {
    pub const ALL: [ChannelName; 4] = [
        ChannelName::Background,
        ChannelName::Chaos,
        ChannelName::Laugh,
        ChannelName::Speech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Background => "background",
            ChannelName::Chaos => "chaos",
            ChannelName::Laugh => "laugh",
            ChannelName::Speech => "speech",
        }
    }

    /// Background and chaos loop until paused; the rest play once
    pub fn loops(&self) -> bool {
        matches!(self, ChannelName::Background | ChannelName::Chaos)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single media operation
///
/// Never propagated past [`AudioChannel`]; media is decoration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Nothing to play on (no device, no clip loaded)
    #[error("media unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the operation
    #[error("playback failed: {0}")]
    Playback(String),
}

/// One playable source as provided by a backend
pub trait MediaElement: Send {
    /// Start or resume playback
    ///
    /// `on_end` is fired once when a one-shot source reaches its natural
    /// end; looping sources never fire it.
    fn play(&mut self, on_end: Option<Completion>) -> Result<(), MediaError>;

    fn pause(&mut self) -> Result<(), MediaError>;

    fn set_volume(&mut self, volume: f32) -> Result<(), MediaError>;

    fn seek_start(&mut self) -> Result<(), MediaError>;

    /// Playback position from the start of the clip
    fn position(&self) -> Duration;
}
