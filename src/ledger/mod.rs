//! In-memory records shown around the séance: past prophecies, found
//! relics and the learning chat

pub mod history;
pub mod relics;
pub mod transcript;

pub use history::{HistoryEntry, ProphecyHistory, VISIBLE_ECHOES};
pub use relics::{Relic, RelicTracker, CHAMPION_MESSAGE, RELICS};
pub use transcript::{LearnMessage, LearnTranscript, Role, ARCHIVE_UNREACHABLE, WELCOME_MESSAGE};
