//! Assembly of the session from configuration
//!
//! Opens the output device when possible and falls back to detached
//! elements otherwise, so the same state machine runs with or without
//! sound.

use super::config::SeanceConfig;
use crate::archive::{ArchiveClient, HttpFetcher, ResultFetcher};
use crate::audio::{AudioChannel, ChannelName, DetachedElement};
use crate::session::{SessionHandle, SessionParts, SessionRuntime};
use crate::speech::SpeechEngine;
use crate::sting::StingStage;
use crate::Result;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[cfg(feature = "audio-io")]
use crate::audio::{load_clip, MediaElement, Mixer};

/// Keeps the output stream open; drop it to silence everything
pub struct OutputGuard {
    #[cfg(feature = "audio-io")]
    mixer: Option<Mixer>,
}

impl OutputGuard {
    pub fn is_live(&self) -> bool {
        #[cfg(feature = "audio-io")]
        {
            self.mixer.is_some()
        }
        #[cfg(not(feature = "audio-io"))]
        {
            false
        }
    }
}

/// The media side of a session
pub struct Backends {
    pub background: AudioChannel,
    pub chaos: AudioChannel,
    pub laugh: AudioChannel,
    pub speech: Option<Box<dyn SpeechEngine>>,
    guard: OutputGuard,
}

impl Backends {
    /// Channels with no device behind them and no speech
    pub fn detached() -> Self {
        let channel = |name: ChannelName| {
            AudioChannel::new(name, Box::new(DetachedElement::new(name.loops())))
        };
        Self {
            background: channel(ChannelName::Background),
            chaos: channel(ChannelName::Chaos),
            laugh: channel(ChannelName::Laugh),
            speech: None,
            guard: OutputGuard {
                #[cfg(feature = "audio-io")]
                mixer: None,
            },
        }
    }

    /// Real output when enabled and available, detached otherwise
    pub fn open(config: &SeanceConfig) -> Self {
        if !config.enable_audio_output {
            info!("Audio output disabled; running silent");
            return Self::detached();
        }

        #[cfg(feature = "audio-io")]
        {
            match Self::from_device(config) {
                Ok(backends) => return backends,
                Err(e) => warn!("{} ({})", e.user_message(), e),
            }
        }

        #[cfg(not(feature = "audio-io"))]
        {
            warn!("Built without audio-io; running silent");
        }

        Self::detached()
    }

    #[cfg(feature = "audio-io")]
    fn from_device(config: &SeanceConfig) -> Result<Self> {
        let mut mixer = Mixer::new()?;
        mixer.start()?;

        let rate = mixer.sample_rate();
        let channel = |name: ChannelName| {
            let clip = config.assets.path(name).and_then(|path| {
                load_clip(&path, rate)
                    .map_err(|e| warn!("No clip for {} channel: {}", name, e))
                    .ok()
            });
            let voice: Box<dyn MediaElement> = Box::new(mixer.voice(name, clip));
            AudioChannel::new(name, voice)
        };

        let background = channel(ChannelName::Background);
        let chaos = channel(ChannelName::Chaos);
        let laugh = channel(ChannelName::Laugh);

        let speech = open_speech(config, &mixer);

        Ok(Self {
            background,
            chaos,
            laugh,
            speech,
            guard: OutputGuard {
                mixer: Some(mixer),
            },
        })
    }

    /// Hand the channels to a session; keep the guard alive meanwhile
    pub fn into_parts(
        self,
        stage: Box<dyn StingStage>,
        fetcher: Box<dyn ResultFetcher>,
    ) -> (SessionParts, OutputGuard) {
        let parts = SessionParts {
            background: self.background,
            chaos: self.chaos,
            laugh: self.laugh,
            speech: self.speech,
            stage,
            fetcher,
        };
        (parts, self.guard)
    }
}

#[cfg(all(feature = "audio-io", feature = "tts"))]
fn open_speech(config: &SeanceConfig, mixer: &Mixer) -> Option<Box<dyn SpeechEngine>> {
    use crate::speech::VitsSpeechEngine;

    let model = config.speech.model.as_ref()?;
    match VitsSpeechEngine::new(model, mixer.voice(ChannelName::Speech, None)) {
        Ok(engine) => {
            info!("Speech engine ready");
            Some(Box::new(engine))
        }
        Err(e) => {
            warn!("{} ({})", e.user_message(), e);
            None
        }
    }
}

#[cfg(all(feature = "audio-io", not(feature = "tts")))]
fn open_speech(config: &SeanceConfig, mixer: &Mixer) -> Option<Box<dyn SpeechEngine>> {
    if config.speech.model.is_some() {
        warn!("TTS model configured but built without the tts feature");
    }
    None
}

/// Build the complete session runtime
///
/// `runtime` runs the archive requests. The returned guard must outlive
/// the session for audio to be heard.
pub fn build_runtime(
    config: &SeanceConfig,
    stage: Box<dyn StingStage>,
    runtime: Handle,
) -> Result<(SessionRuntime, SessionHandle, OutputGuard, Arc<ArchiveClient>)> {
    let client = Arc::new(ArchiveClient::new(&config.archive)?);
    let fetcher = Box::new(HttpFetcher::new(Arc::clone(&client), runtime));

    let (parts, guard) = Backends::open(config).into_parts(stage, fetcher);
    let (session, handle) = SessionRuntime::new(parts, config);

    info!(
        "Session ready (archive: {}, audio: {})",
        client.seance_url(),
        if guard.is_live() { "on" } else { "off" }
    );

    Ok((session, handle, guard, client))
}
