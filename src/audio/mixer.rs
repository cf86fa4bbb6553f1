use super::{ChannelName, Clip, MediaElement, MediaError};
use crate::session::Completion;
use crate::{Result, SeanceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Default)]
struct VoiceState {
    clip: Option<Clip>,
    cursor: usize,
    volume: f32,
    playing: bool,
    looping: bool,
    on_end: Option<Completion>,
}

/// One output stream summing every registered voice
///
/// The stream is not `Send` on every platform, so the mixer stays on the
/// thread that created it; only [`MixerVoice`] handles travel.
pub struct Mixer {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    voices: Arc<Mutex<Vec<Arc<Mutex<VoiceState>>>>>,
}

impl Mixer {
    /// Create a mixer on the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| SeanceError::AudioDeviceError("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| {
                SeanceError::AudioDeviceError(format!("Failed to get output config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            voices: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Register a voice for `name`, optionally preloaded with a clip
    pub fn voice(&self, name: ChannelName, clip: Option<Clip>) -> MixerVoice {
        let state = Arc::new(Mutex::new(VoiceState {
            clip,
            looping: name.loops(),
            ..VoiceState::default()
        }));
        self.voices.lock().push(Arc::clone(&state));

        MixerVoice {
            name,
            state,
            sample_rate: self.sample_rate(),
        }
    }

    /// Open the output stream
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            warn!("Mixer already running");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let voices = Arc::clone(&self.voices);

        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);

                    for voice in voices.lock().iter() {
                        let mut voice = voice.lock();
                        mix_voice(&mut voice, data, channels);
                    }

                    for sample in data.iter_mut() {
                        *sample = sample.clamp(-1.0, 1.0);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                SeanceError::AudioDeviceError(format!("Failed to build output stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            SeanceError::AudioDeviceError(format!("Failed to start output stream: {}", e))
        })?;

        self.stream = Some(stream);
        info!("Mixer started at {} Hz", self.sample_rate());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Mixer stopped");
        }
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn mix_voice(voice: &mut VoiceState, data: &mut [f32], channels: usize) {
    if !voice.playing {
        return;
    }
    let Some(clip) = voice.clip.clone() else {
        return;
    };
    let len = clip.samples.len();
    if len == 0 {
        return;
    }

    for frame in data.chunks_mut(channels) {
        if voice.cursor >= len {
            if voice.looping {
                voice.cursor = 0;
            } else {
                voice.playing = false;
                if let Some(on_end) = voice.on_end.take() {
                    on_end.fire();
                }
                return;
            }
        }

        let sample = clip.samples[voice.cursor] * voice.volume;
        for out in frame.iter_mut() {
            *out += sample;
        }
        voice.cursor += 1;
    }
}

/// Handle to one mixer voice
#[derive(Clone)]
pub struct MixerVoice {
    name: ChannelName,
    state: Arc<Mutex<VoiceState>>,
    sample_rate: u32,
}

impl MixerVoice {
    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// Replace the clip; playback stops and rewinds
    pub fn load(&self, clip: Clip) {
        let mut state = self.state.lock();
        state.clip = Some(clip);
        state.cursor = 0;
        state.playing = false;
        state.on_end = None;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl MediaElement for MixerVoice {
    fn play(&mut self, on_end: Option<Completion>) -> std::result::Result<(), MediaError> {
        let mut state = self.state.lock();
        let len = state.clip.as_ref().map(|c| c.samples.len()).unwrap_or(0);
        if len == 0 {
            return Err(MediaError::Unavailable(format!("{} has no clip loaded", self.name)));
        }
        if state.cursor >= len {
            state.cursor = 0;
        }
        state.on_end = on_end;
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> std::result::Result<(), MediaError> {
        self.state.lock().playing = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> std::result::Result<(), MediaError> {
        self.state.lock().volume = volume;
        Ok(())
    }

    fn seek_start(&mut self) -> std::result::Result<(), MediaError> {
        self.state.lock().cursor = 0;
        Ok(())
    }

    fn position(&self) -> Duration {
        let cursor = self.state.lock().cursor;
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(cursor as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{EventSink, SessionEvent, SessionToken};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_one_shot_voice_fires_end_once() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let mut voice = VoiceState {
            clip: Some(Clip::new(vec![0.5; 4], 8000)),
            volume: 1.0,
            playing: true,
            on_end: Some(sink.completion(SessionEvent::LaughEnded {
                token: SessionToken::NONE,
            })),
            ..VoiceState::default()
        };

        let mut data = vec![0.0f32; 12];
        mix_voice(&mut voice, &mut data, 2);
        mix_voice(&mut voice, &mut data, 2);

        assert!(!voice.playing);
        assert_eq!(data[0], 0.5);
        assert_eq!(data[7], 0.5);
        assert_eq!(data[8], 0.0);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_looping_voice_wraps() {
        let mut voice = VoiceState {
            clip: Some(Clip::new(vec![0.1, 0.2], 8000)),
            volume: 1.0,
            playing: true,
            looping: true,
            ..VoiceState::default()
        };

        let mut data = vec![0.0f32; 5];
        mix_voice(&mut voice, &mut data, 1);
        assert!(voice.playing);
        assert_eq!(data, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
    }

    #[test]
    fn test_mixer_creation() {
        // Might fail in CI environments without audio devices
        if let Ok(mixer) = Mixer::new() {
            assert!(mixer.sample_rate() > 0);
            assert!(mixer.channels() > 0);
        }
    }
}
