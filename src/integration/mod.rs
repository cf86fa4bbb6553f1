//! Wiring of configuration, devices and the session loop

pub mod config;
pub mod wiring;

pub use config::{ArchiveConfig, AssetConfig, SeanceConfig, SpeechConfig, StingConfig, TtsModelConfig};
pub use wiring::{build_runtime, Backends, OutputGuard};
