use super::SessionToken;
use crate::archive::Prophecy;
use std::fmt;

/// Stages of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Submitting,
    WaitingForResult,
    Narrating,
    Laughing,
    Resuming,
    Errored,
}

impl SessionState {
    /// Whether a session is in flight
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Submitting => "submitting",
            SessionState::WaitingForResult => "waiting",
            SessionState::Narrating => "narrating",
            SessionState::Laughing => "laughing",
            SessionState::Resuming => "resuming",
            SessionState::Errored => "errored",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted query and what became of it
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub token: SessionToken,
    /// Trimmed, never empty
    pub query: String,
    pub state: SessionState,
    /// Set once on a successful fetch
    pub result: Option<Prophecy>,
    /// Set on failure; never together with `result`
    pub error: Option<String>,
}

impl PlaybackSession {
    pub fn new(token: SessionToken, query: impl Into<String>) -> Self {
        Self {
            token,
            query: query.into(),
            state: SessionState::Idle,
            result: None,
            error: None,
        }
    }
}

/// Everything the UI renders from the session loop
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub loading: bool,
    pub result: Option<Prophecy>,
    pub error: Option<String>,
    pub controls_disabled: bool,
    pub background_volume: f32,
    pub chaos_volume: f32,
    pub sting_active: bool,
    pub token: SessionToken,
    pub query: Option<String>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            loading: false,
            result: None,
            error: None,
            controls_disabled: false,
            background_volume: 0.0,
            chaos_volume: 0.0,
            sting_active: false,
            token: SessionToken::NONE,
            query: None,
        }
    }
}

/// Output of the session loop
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    /// A session moved between stages
    Transition {
        token: SessionToken,
        from: SessionState,
        to: SessionState,
    },

    /// Fresh snapshot after a transition
    View(SessionView),

    /// A session was abandoned for a newer submission
    Superseded { token: SessionToken },
}
