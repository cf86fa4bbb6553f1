//! VITS speech engine backed by sherpa-rs
//!
//! Synthesis runs on a dedicated worker thread; finished audio plays through
//! the mixer's speech voice, whose natural end fires the narration end.

use super::engine::{SpeechEngine, Utterance, VoiceInfo};
use super::gate::PlaybackGate;
use crate::audio::resampler::ClipResampler;
use crate::audio::{Clip, MixerVoice};
use crate::integration::TtsModelConfig;
use crate::session::Completion;
use crate::{Result, SeanceError};
use crossbeam_channel::{unbounded, Sender};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use std::thread;
use tracing::{debug, info, warn};

enum SynthCommand {
    Speak {
        utterance: Utterance,
        speaker: i32,
        on_end: Completion,
        generation: u64,
    },
    Shutdown,
}

pub struct VitsSpeechEngine {
    voices: Vec<VoiceInfo>,
    output: MixerVoice,
    command_tx: Sender<SynthCommand>,
    /// Bumped on every speak and cancel; stale synthesis never plays
    gate: PlaybackGate,
}

impl VitsSpeechEngine {
    /// Load the model on a worker thread that plays into `output`
    pub fn new(config: &TtsModelConfig, output: MixerVoice) -> Result<Self> {
        if !Path::new(&config.model_path).exists() {
            return Err(SeanceError::TTSError(format!(
                "Model not found: {}",
                config.model_path
            )));
        }
        if !Path::new(&config.tokens_path).exists() {
            return Err(SeanceError::TTSError(format!(
                "Tokens file not found: {}",
                config.tokens_path
            )));
        }

        let voices = speaker_voices(&config.speakers);
        let gate = PlaybackGate::new();
        let (command_tx, command_rx) = unbounded::<SynthCommand>();

        let vits_config = VitsTtsConfig {
            model: config.model_path.clone(),
            tokens: config.tokens_path.clone(),
            data_dir: config.data_dir.clone().unwrap_or_default(),
            length_scale: 1.0,
            ..Default::default()
        };

        let worker_output = output.clone();
        let worker_gate = gate.clone();

        thread::Builder::new()
            .name("seance-tts".into())
            .spawn(move || {
                info!("Loading VITS model from: {}", vits_config.model);
                let mut tts = VitsTts::new(vits_config);
                info!("TTS worker ready");

                while let Ok(command) = command_rx.recv() {
                    match command {
                        SynthCommand::Speak {
                            utterance,
                            speaker,
                            on_end,
                            generation,
                        } => {
                            debug!("Synthesizing utterance {}", utterance.id);
                            let audio = match tts.create(&utterance.text, speaker, utterance.rate) {
                                Ok(audio) => audio,
                                Err(e) => {
                                    warn!("Synthesis failed for utterance {}: {}", utterance.id, e);
                                    on_end.fire();
                                    continue;
                                }
                            };

                            if !worker_gate.is_current(generation) {
                                debug!("Utterance {} cancelled during synthesis", utterance.id);
                                continue;
                            }

                            let mut output = worker_output.clone();
                            let target_rate = output.sample_rate();
                            let source_rate = audio.sample_rate as u32;
                            let samples = if source_rate != target_rate && !audio.samples.is_empty() {
                                match ClipResampler::new(source_rate, target_rate)
                                    .and_then(|mut r| r.resample(&audio.samples))
                                {
                                    Ok(samples) => samples,
                                    Err(e) => {
                                        warn!("Failed to resample speech: {}", e);
                                        on_end.fire();
                                        continue;
                                    }
                                }
                            } else {
                                audio.samples
                            };

                            let delivery = worker_gate.start(
                                generation,
                                &mut output,
                                |voice| {
                                    if samples.is_empty() {
                                        return false;
                                    }
                                    voice.load(Clip::new(samples, target_rate));
                                    true
                                },
                                on_end,
                            );
                            debug!("Utterance {}: {:?}", utterance.id, delivery);
                        }
                        SynthCommand::Shutdown => break,
                    }
                }

                info!("TTS worker stopped");
            })
            .map_err(|e| SeanceError::TTSError(format!("Failed to spawn TTS worker: {}", e)))?;

        Ok(Self {
            voices,
            output,
            command_tx,
            gate,
        })
    }
}

/// Named speakers, or a single default one
fn speaker_voices(speakers: &[String]) -> Vec<VoiceInfo> {
    if speakers.is_empty() {
        return vec![VoiceInfo::new("speaker 0").as_default()];
    }
    speakers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let voice = VoiceInfo::new(name.clone());
            if i == 0 {
                voice.as_default()
            } else {
                voice
            }
        })
        .collect()
}

impl SpeechEngine for VitsSpeechEngine {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance, on_end: Completion) -> Result<()> {
        let generation = self.gate.issue();
        let speaker = utterance
            .voice
            .as_ref()
            .and_then(|v| self.voices.iter().position(|known| known.name == v.name))
            .unwrap_or(0) as i32;

        if (utterance.pitch - 1.0).abs() > f32::EPSILON {
            debug!("VITS voices have a fixed pitch; ignoring {}", utterance.pitch);
        }

        self.command_tx
            .send(SynthCommand::Speak {
                utterance,
                speaker,
                on_end,
                generation,
            })
            .map_err(|_| SeanceError::TTSError("TTS worker is gone".into()))
    }

    fn cancel(&mut self) {
        self.gate.cancel(&mut self.output);
    }
}

impl Drop for VitsSpeechEngine {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SynthCommand::Shutdown);
    }
}
