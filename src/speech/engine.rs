use crate::session::Completion;
use crate::Result;

/// A voice offered by a speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub language: Option<String>,
    pub is_default: bool,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: None,
            is_default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// One sanitized text handed to an engine
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<VoiceInfo>,
}

/// Host text-to-speech capability
pub trait SpeechEngine: Send {
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking; `on_end` fires when playback finishes
    ///
    /// After [`cancel`](Self::cancel) the engine may drop `on_end` unfired.
    fn speak(&mut self, utterance: Utterance, on_end: Completion) -> Result<()>;

    /// Stop whatever is being spoken
    fn cancel(&mut self);
}

/// Pick the voice matching `hint`, else the default, else the first
pub fn select_voice(voices: &[VoiceInfo], hint: Option<&str>) -> Option<VoiceInfo> {
    let hint = hint.map(str::trim).filter(|h| !h.is_empty());

    if let Some(hint) = hint {
        let hint = hint.to_lowercase();
        if let Some(voice) = voices
            .iter()
            .find(|v| v.name.to_lowercase().contains(&hint))
        {
            return Some(voice.clone());
        }
    }

    voices
        .iter()
        .find(|v| v.is_default)
        .or_else(|| voices.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Bright"),
            VoiceInfo::new("Standard").as_default(),
            VoiceInfo::new("Deep Hollow"),
        ]
    }

    #[test]
    fn test_hint_matches_case_insensitively() {
        let voice = select_voice(&voices(), Some("deep")).unwrap();
        assert_eq!(voice.name, "Deep Hollow");
    }

    #[test]
    fn test_falls_back_to_default() {
        let voice = select_voice(&voices(), Some("whisper")).unwrap();
        assert_eq!(voice.name, "Standard");

        let voice = select_voice(&voices(), None).unwrap();
        assert_eq!(voice.name, "Standard");
    }

    #[test]
    fn test_falls_back_to_first_without_default() {
        let voices = vec![VoiceInfo::new("a"), VoiceInfo::new("b")];
        assert_eq!(select_voice(&voices, Some("  ")).unwrap().name, "a");
        assert!(select_voice(&[], Some("deep")).is_none());
    }
}
