use crate::archive::Prophecy;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How many entries the sidebar shows
pub const VISIBLE_ECHOES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub cipher: String,
    pub interpretation: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, prophecy: &Prophecy) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            cipher: prophecy.cipher.clone(),
            interpretation: prophecy.interpretation.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn prophecy(&self) -> Prophecy {
        Prophecy::new(self.cipher.clone(), self.interpretation.clone())
    }
}

/// Past prophecies, newest first
#[derive(Debug, Clone, Default)]
pub struct ProphecyHistory {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl ProphecyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, query: impl Into<String>, prophecy: &Prophecy) -> HistoryEntry {
        let entry = HistoryEntry::new(query, prophecy);
        self.entries.write().insert(0, entry.clone());
        entry
    }

    /// The entries the sidebar shows
    pub fn recent(&self) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .iter()
            .take(VISIBLE_ECHOES)
            .cloned()
            .collect()
    }

    pub fn get_all(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    /// Remove by position in the newest-first list
    pub fn delete(&self, index: usize) -> Option<HistoryEntry> {
        let mut entries = self.entries.write();
        (index < entries.len()).then(|| entries.remove(index))
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prophecy(n: usize) -> Prophecy {
        Prophecy::new(format!("cipher {}", n), format!("reading {}", n))
    }

    #[test]
    fn test_newest_first_and_recent_window() {
        let history = ProphecyHistory::new();
        for n in 0..7 {
            history.record(format!("query {}", n), &prophecy(n));
        }

        let recent = history.recent();
        assert_eq!(recent.len(), VISIBLE_ECHOES);
        assert_eq!(recent[0].query, "query 6");
        assert_eq!(recent[4].query, "query 2");
        assert_eq!(history.len(), 7);
    }

    #[test]
    fn test_delete_and_clear() {
        let history = ProphecyHistory::new();
        history.record("old", &prophecy(0));
        history.record("new", &prophecy(1));

        let removed = history.delete(1).unwrap();
        assert_eq!(removed.query, "old");
        assert!(history.delete(5).is_none());
        assert_eq!(history.get_all()[0].prophecy(), prophecy(1));

        history.clear();
        assert!(history.is_empty());
    }
}
