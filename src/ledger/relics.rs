//! Hidden keywords ("relics") and the badges they unlock

use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relic {
    pub keyword: &'static str,
    pub badge: &'static str,
    pub icon: &'static str,
    /// Whisper shown while this is the next relic to find
    pub hint: &'static str,
}

pub const RELICS: [Relic; 5] = [
    Relic {
        keyword: "gopher",
        badge: "Gopher Seeker",
        icon: "🦫",
        hint: "The void whispers... seek the burrowing beast of data tunnels...",
    },
    Relic {
        keyword: "protocol",
        badge: "Protocol Scholar",
        icon: "📜",
        hint: "The spirits murmur... ancient rules govern the digital realm...",
    },
    Relic {
        keyword: "ancient",
        badge: "Ancient Wisdom",
        icon: "⚱️",
        hint: "Echoes from forgotten times... what predates the modern web?",
    },
    Relic {
        keyword: "kiroween",
        badge: "Kiroween Spirit",
        icon: "🎃",
        hint: "A spectral celebration draws near... the harvest of code...",
    },
    Relic {
        keyword: "kiro",
        badge: "Kiro Champion",
        icon: "🏆",
        hint: "The final secret lies with the oracle's creator... speak its name...",
    },
];

pub const CHAMPION_MESSAGE: &str =
    "🏆 ALL EGGS FOUND, CHAMPION OF THE VOID! THE NEXUS BOWS TO THEE! 🏆";

/// Keywords found so far, in discovery order
#[derive(Debug, Clone, Default)]
pub struct RelicTracker {
    found: Arc<RwLock<Vec<&'static str>>>,
}

impl RelicTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every relic named as a whole word in `query`
    ///
    /// Returns the newly found ones.
    pub fn observe(&self, query: &str) -> Vec<Relic> {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut found = self.found.write();
        let mut fresh = Vec::new();
        for relic in RELICS.iter() {
            if found.contains(&relic.keyword) {
                continue;
            }
            if words.iter().any(|w| w == relic.keyword) {
                found.push(relic.keyword);
                fresh.push(*relic);
            }
        }
        fresh
    }

    pub fn is_found(&self, keyword: &str) -> bool {
        self.found.read().iter().any(|k| *k == keyword)
    }

    pub fn found(&self) -> Vec<&'static str> {
        self.found.read().clone()
    }

    /// `(found, total)`
    pub fn progress(&self) -> (usize, usize) {
        (self.found.read().len(), RELICS.len())
    }

    pub fn is_complete(&self) -> bool {
        self.found.read().len() == RELICS.len()
    }

    /// Whisper for the first relic not yet found
    pub fn hint(&self) -> &'static str {
        let found = self.found.read();
        RELICS
            .iter()
            .find(|r| !found.contains(&r.keyword))
            .map(|r| r.hint)
            .unwrap_or(CHAMPION_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_match() {
        let tracker = RelicTracker::new();

        let fresh = tracker.observe("Tell me of the KIROWEEN feast");
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].keyword, "kiroween");
        assert!(!tracker.is_found("kiro"));

        assert!(tracker.observe("gophers everywhere").is_empty());
        assert_eq!(tracker.observe("what is gopher?")[0].badge, "Gopher Seeker");
        assert!(tracker.observe("gopher again").is_empty());
        assert_eq!(tracker.progress(), (2, 5));
    }

    #[test]
    fn test_hint_follows_first_missing() {
        let tracker = RelicTracker::new();
        assert_eq!(tracker.hint(), RELICS[0].hint);

        tracker.observe("gopher protocol");
        assert_eq!(tracker.hint(), RELICS[2].hint);

        tracker.observe("ancient kiroween kiro");
        assert!(tracker.is_complete());
        assert_eq!(tracker.hint(), CHAMPION_MESSAGE);
    }
}
