use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "Welcome to the Gopher Archive Learning Portal. I can help you understand:\n\n\
• Gopher protocol history and technical details\n\
• Differences between old and modern technologies\n\
• Internet evolution from 1990s to today\n\
• Vintage computing and protocols\n\n\
What would you like to learn about?";

pub const ARCHIVE_UNREACHABLE: &str = "Unable to connect to archive. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Archive,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "YOU",
            Role::Archive => "ARCHIVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Archive reply that stands in for a failed request
    pub is_error: bool,
}

impl LearnMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Archive, content)
        }
    }
}

/// The learning chat, starting with the welcome message
#[derive(Debug, Clone)]
pub struct LearnTranscript {
    messages: Arc<RwLock<Vec<LearnMessage>>>,
}

impl Default for LearnTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl LearnTranscript {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(vec![LearnMessage::new(
                Role::Archive,
                WELCOME_MESSAGE,
            )])),
        }
    }

    pub fn add(&self, message: LearnMessage) {
        self.messages.write().push(message);
    }

    pub fn add_question(&self, content: impl Into<String>) {
        self.add(LearnMessage::new(Role::User, content));
    }

    pub fn add_answer(&self, content: impl Into<String>) {
        self.add(LearnMessage::new(Role::Archive, content));
    }

    pub fn add_failure(&self) {
        self.add(LearnMessage::error(ARCHIVE_UNREACHABLE));
    }

    pub fn get_all(&self) -> Vec<LearnMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Plain-text export, one `[time] ROLE:` block per message
    pub fn transcript_text(&self) -> String {
        self.messages
            .read()
            .iter()
            .map(|msg| {
                let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S");
                format!("[{}] {}:\n{}\n", time, msg.role.label(), msg.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_welcome() {
        let transcript = LearnTranscript::new();
        let messages = transcript.get_all();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Archive);
        assert!(messages[0].content.starts_with("Welcome to the Gopher Archive"));
    }

    #[test]
    fn test_transcript_text_format() {
        let transcript = LearnTranscript::new();
        transcript.add_question("What is gopher?");
        transcript.add_failure();

        let text = transcript.transcript_text();
        let blocks: Vec<&str> = text.split("\n\n[").collect();
        assert!(text.starts_with('['));
        assert!(text.contains("] YOU:\nWhat is gopher?\n"));
        assert!(text.contains("] ARCHIVE:\nUnable to connect to archive. Please try again.\n"));
        assert!(blocks.len() >= 3);
        assert!(transcript.get_all()[2].is_error);
    }
}
