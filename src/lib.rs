pub mod archive;
pub mod audio;
pub mod integration;
pub mod ledger;
pub mod session;
pub mod speech;
pub mod sting;
#[cfg(feature = "gui")]
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SeanceError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("TTS error: {0}")]
    TTSError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for SeanceError {
    fn from(e: std::io::Error) -> Self {
        SeanceError::IOError(e.to_string())
    }
}

impl SeanceError {
    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SeanceError::AudioDeviceError(_) => {
                "Audio device error. The séance continues in silence.".to_string()
            }
            SeanceError::AudioProcessingError(_) => {
                "A sound file could not be prepared.".to_string()
            }
            SeanceError::TTSError(_) => {
                "The medium has lost her voice. The prophecy is shown as text.".to_string()
            }
            SeanceError::ArchiveError(_) => {
                "Unable to reach the archive. Please try again.".to_string()
            }
            SeanceError::IOError(_) => "File system error occurred.".to_string(),
            SeanceError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SeanceError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SeanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_details() {
        let error = SeanceError::ConfigError("SEANCE_ARCHIVE_TIMEOUT_SECS is not a number: soon".into());
        assert!(error.to_string().contains("soon"));
        assert!(!error.user_message().contains("soon"));

        let io: SeanceError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.user_message(), "File system error occurred.");
    }
}
