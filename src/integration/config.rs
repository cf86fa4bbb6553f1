//! Configuration for the séance
//!
//! Provides centralized configuration for all components.

use crate::audio::ChannelName;
use crate::session::VolumePolicy;
use crate::speech::NarrationBounds;
use crate::{Result, SeanceError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the archive service lives
#[derive(Clone, Debug)]
pub struct ArchiveConfig {
    /// Scheme, host and port, e.g. `http://localhost:5000`
    pub base_url: String,
    pub seance_path: String,
    pub learn_path: String,
    /// Upper bound for a single request
    pub timeout: Duration,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            seance_path: "/api/seance".to_string(),
            learn_path: "/api/learn".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Sound files for the named channels
#[derive(Clone, Debug)]
pub struct AssetConfig {
    pub dir: PathBuf,
    pub background: String,
    pub chaos: String,
    pub laugh: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            background: "background.wav".to_string(),
            chaos: "chaos.wav".to_string(),
            laugh: "laugh.wav".to_string(),
        }
    }
}

impl AssetConfig {
    /// Clip path for a channel; speech has no file
    pub fn path(&self, channel: ChannelName) -> Option<PathBuf> {
        let file = match channel {
            ChannelName::Background => &self.background,
            ChannelName::Chaos => &self.chaos,
            ChannelName::Laugh => &self.laugh,
            ChannelName::Speech => return None,
        };
        Some(self.dir.join(file))
    }
}

/// Model files for the VITS speech engine
#[derive(Clone, Debug, Default)]
pub struct TtsModelConfig {
    pub model_path: String,
    pub tokens_path: String,
    pub data_dir: Option<String>,
    /// Voice names exposed for speaker ids 0, 1, 2...
    pub speakers: Vec<String>,
}

/// Narration preferences
#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub rate: f32,
    pub pitch: f32,
    /// Soft preference matched against voice names
    pub voice_hint: Option<String>,
    pub bounds: NarrationBounds,
    /// No model means no speech capability
    pub model: Option<TtsModelConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 0.6,
            pitch: 0.7,
            voice_hint: Some("deep".to_string()),
            bounds: NarrationBounds::default(),
            model: None,
        }
    }
}

/// Laugh sting timings
#[derive(Clone, Debug)]
pub struct StingConfig {
    /// Completion is forced after this long even if the clip never ends
    pub fallback: Duration,
    /// Overlay fade-out after the laugh ends
    pub exit_animation: Duration,
}

impl Default for StingConfig {
    fn default() -> Self {
        Self {
            fallback: Duration::from_secs(8),
            exit_animation: Duration::from_millis(600),
        }
    }
}

/// Configuration for the complete application
#[derive(Clone, Debug)]
pub struct SeanceConfig {
    pub archive: ArchiveConfig,
    pub assets: AssetConfig,
    pub volumes: VolumePolicy,
    pub speech: SpeechConfig,
    pub sting: StingConfig,

    /// Whether to open an audio output device
    pub enable_audio_output: bool,
}

impl Default for SeanceConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            assets: AssetConfig::default(),
            volumes: VolumePolicy::default(),
            speech: SpeechConfig::default(),
            sting: StingConfig::default(),
            enable_audio_output: true,
        }
    }
}

impl SeanceConfig {
    /// Build a configuration from `SEANCE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SEANCE_ARCHIVE_URL") {
            config.archive.base_url = url;
        }

        if let Some(secs) = lookup("SEANCE_ARCHIVE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SeanceError::ConfigError(format!("SEANCE_ARCHIVE_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.archive.timeout = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup("SEANCE_ASSETS_DIR") {
            config.assets.dir = PathBuf::from(dir);
        }

        if let Some(audio) = lookup("SEANCE_AUDIO") {
            if matches!(audio.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false") {
                config.enable_audio_output = false;
            }
        }

        if let Some(hint) = lookup("SEANCE_VOICE_HINT") {
            config.speech.voice_hint = Some(hint).filter(|h| !h.trim().is_empty());
        }

        if let (Some(model), Some(tokens)) =
            (lookup("SEANCE_TTS_MODEL"), lookup("SEANCE_TTS_TOKENS"))
        {
            config.speech.model = Some(TtsModelConfig {
                model_path: model,
                tokens_path: tokens,
                data_dir: lookup("SEANCE_TTS_DATA_DIR"),
                speakers: lookup("SEANCE_TTS_SPEAKERS")
                    .map(|s| s.split(',').map(|v| v.trim().to_string()).collect())
                    .unwrap_or_default(),
            });
        }

        Ok(config)
    }

    /// Set the archive base URL
    pub fn with_archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive.base_url = url.into();
        self
    }

    /// Set the directory holding the sound clips
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets.dir = dir.into();
        self
    }

    /// Set the TTS model paths
    pub fn with_tts_model(
        mut self,
        model_path: impl Into<String>,
        tokens_path: impl Into<String>,
    ) -> Self {
        self.speech.model = Some(TtsModelConfig {
            model_path: model_path.into(),
            tokens_path: tokens_path.into(),
            ..TtsModelConfig::default()
        });
        self
    }

    /// Disable audio output (silent mode)
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.archive.base_url.starts_with("http://")
            && !self.archive.base_url.starts_with("https://")
        {
            return Err(SeanceError::ConfigError(format!(
                "Archive URL must be http(s): {}",
                self.archive.base_url
            )));
        }

        if self.archive.timeout.is_zero() {
            return Err(SeanceError::ConfigError("Archive timeout must be positive".into()));
        }

        self.volumes.validate()?;

        if self.speech.rate <= 0.0 {
            return Err(SeanceError::ConfigError("Speech rate must be positive".into()));
        }

        if self.sting.fallback.is_zero() {
            return Err(SeanceError::ConfigError("Sting fallback must be positive".into()));
        }

        if let Some(model) = &self.speech.model {
            if !Path::new(&model.model_path).exists() {
                return Err(SeanceError::ConfigError(format!(
                    "TTS model not found: {}",
                    model.model_path
                )));
            }
            if !Path::new(&model.tokens_path).exists() {
                return Err(SeanceError::ConfigError(format!(
                    "TTS tokens file not found: {}",
                    model.tokens_path
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SeanceConfig::default();
        assert!(config.enable_audio_output);
        assert_eq!(config.archive.base_url, "http://localhost:5000");
        assert!((config.speech.rate - 0.6).abs() < f32::EPSILON);
        assert!((config.speech.pitch - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SeanceConfig::default()
            .with_archive_url("https://archive.example")
            .with_assets_dir("/opt/seance")
            .without_audio_output();

        assert!(!config.enable_audio_output);
        assert_eq!(config.archive.base_url, "https://archive.example");
        assert_eq!(
            config.assets.path(ChannelName::Laugh),
            Some(PathBuf::from("/opt/seance/laugh.wav"))
        );
        assert_eq!(config.assets.path(ChannelName::Speech), None);
    }

    #[test]
    fn test_from_lookup() {
        let config = SeanceConfig::from_lookup(lookup_from(&[
            ("SEANCE_ARCHIVE_URL", "http://10.0.0.2:5000"),
            ("SEANCE_ARCHIVE_TIMEOUT_SECS", "5"),
            ("SEANCE_AUDIO", "off"),
            ("SEANCE_VOICE_HINT", "daniel"),
            ("SEANCE_TTS_MODEL", "vits.onnx"),
            ("SEANCE_TTS_TOKENS", "tokens.txt"),
            ("SEANCE_TTS_SPEAKERS", "low, hollow"),
        ]))
        .unwrap();

        assert_eq!(config.archive.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.archive.timeout, Duration::from_secs(5));
        assert!(!config.enable_audio_output);
        assert_eq!(config.speech.voice_hint.as_deref(), Some("daniel"));
        let model = config.speech.model.unwrap();
        assert_eq!(model.speakers, vec!["low".to_string(), "hollow".to_string()]);
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let result =
            SeanceConfig::from_lookup(lookup_from(&[("SEANCE_ARCHIVE_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(SeanceError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_missing_model() {
        let config = SeanceConfig::default().with_tts_model("/nonexistent.onnx", "/nonexistent.txt");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = SeanceConfig::default().with_archive_url("gopher://archive");
        assert!(config.validate().is_err());
    }
}
