//! Wire types for the archive service

use crate::SeanceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a séance: the archive's cipher and the medium's reading of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prophecy {
    /// Raw cryptic entry found in the archive
    pub cipher: String,
    /// Spoken interpretation of the cipher
    pub interpretation: String,
}

impl Prophecy {
    pub fn new(cipher: impl Into<String>, interpretation: impl Into<String>) -> Self {
        Self {
            cipher: cipher.into(),
            interpretation: interpretation.into(),
        }
    }
}

/// Failure to obtain a usable reply from the archive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, timeout, broken body
    #[error("archive unreachable: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("archive returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Success status but the body lacks the expected fields
    #[error("malformed archive reply: {0}")]
    Content(String),
}

impl FetchError {
    /// Whether the archive answered but the answer was unusable
    pub fn is_content(&self) -> bool {
        matches!(self, FetchError::Content(_))
    }

    /// Text shown to the user in place of a prophecy
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) | FetchError::Status { .. } => {
                "The spirits cannot reach the archive. Please try again.".to_string()
            }
            FetchError::Content(_) => {
                "The archive answered in a tongue no medium can read. Please try again."
                    .to_string()
            }
        }
    }
}

impl From<FetchError> for SeanceError {
    fn from(e: FetchError) -> Self {
        SeanceError::ArchiveError(e.to_string())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SeanceRequest<'a> {
    pub user_query: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LearnRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
struct SeanceReply {
    cryptic_response: Option<String>,
    interpretation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LearnReply {
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: Option<String>,
}

/// Placeholder used when the learning endpoint answers without text
pub const EMPTY_LEARN_REPLY: &str = "No response from archive.";

/// Parse a successful `/api/seance` body
pub fn parse_prophecy(body: &str) -> Result<Prophecy, FetchError> {
    let reply: SeanceReply =
        serde_json::from_str(body).map_err(|e| FetchError::Content(e.to_string()))?;

    let cipher = reply
        .cryptic_response
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FetchError::Content("missing cryptic_response".into()))?;
    let interpretation = reply
        .interpretation
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FetchError::Content("missing interpretation".into()))?;

    Ok(Prophecy {
        cipher,
        interpretation,
    })
}

/// Parse a successful `/api/learn` body
pub fn parse_learn_reply(body: &str) -> Result<String, FetchError> {
    let reply: LearnReply =
        serde_json::from_str(body).map_err(|e| FetchError::Content(e.to_string()))?;

    Ok(reply
        .response
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| EMPTY_LEARN_REPLY.to_string()))
}

/// Extract the server's `{"error": ...}` text from a failure body
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorReply>(body)
        .ok()
        .and_then(|reply| reply.error)
}
