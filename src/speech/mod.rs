//! Narration of prophecies
//!
//! This module provides:
//! - Markup sanitizing so symbols are not read aloud
//! - The [`SpeechEngine`] seam and voice selection
//! - [`SpeechNarrator`], which guarantees one accepted end per request
//! - [`PlaybackGate`], ordering cancellation against playback start
//! - A VITS engine via sherpa-rs (`tts` feature)

pub mod engine;
pub mod gate;
pub mod markup;
pub mod narrator;
#[cfg(feature = "tts")]
pub mod vits;

pub use engine::{select_voice, SpeechEngine, Utterance, VoiceInfo};
pub use gate::{Delivery, PlaybackGate};
pub use markup::sanitize_markup;
pub use narrator::{NarrationBounds, SpeechNarrator, SpeechRequest};
#[cfg(feature = "tts")]
pub use vits::VitsSpeechEngine;
