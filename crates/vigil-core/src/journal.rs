//! Bounded, newest-first event journal plus the persistence seams the
//! store crate implements.

use std::collections::VecDeque;

use thiserror::Error;

use crate::domain::{LogEntry, Settings};

/// Durable-storage failure as seen by the engine. Backends map their own
/// error types into this.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage backend: {0}")]
    Backend(String),
    #[error("stored payload is corrupt: {0}")]
    Corrupt(String),
}

pub trait SettingsPersistence: Send {
    fn load_settings(&self) -> Result<Option<Settings>, PersistError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), PersistError>;
}

pub trait LogPersistence: Send {
    /// Newest-first, as stored.
    fn load_log(&self) -> Result<Vec<LogEntry>, PersistError>;
    /// Replaces the whole durable sequence; called after every mutation.
    fn save_log(&self, entries: &[LogEntry]) -> Result<(), PersistError>;
    fn clear_log(&self) -> Result<(), PersistError>;
}

/// Both durable records behind one handle.
pub trait StatePersistence: SettingsPersistence + LogPersistence {}

impl<T: SettingsPersistence + LogPersistence> StatePersistence for T {}

/// In-memory bounded journal: append at the front, evict from the back.
#[derive(Debug)]
pub struct Journal {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rehydrate from a stored newest-first sequence, re-applying the cap
    /// (the configured capacity may have shrunk since the data was
    /// written).
    pub fn from_entries(capacity: usize, entries: Vec<LogEntry>) -> Self {
        let mut journal = Self::new(capacity);
        for entry in entries.into_iter().rev() {
            journal.append(entry);
        }
        journal
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn head(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassifierState, SafetyStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(tag: &str) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            status: SafetyStatus::Safe,
            state: ClassifierState::Normal,
            sensor_summary: tag.to_string(),
        }
    }

    #[test]
    fn append_is_newest_first() {
        let mut journal = Journal::new(10);
        journal.append(entry("first"));
        journal.append(entry("second"));
        let order: Vec<_> = journal.entries().map(|e| e.sensor_summary.clone()).collect();
        assert_eq!(order, vec!["second", "first"]);
        assert_eq!(journal.head().unwrap().sensor_summary, "second");
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut journal = Journal::new(3);
        for tag in ["a", "b", "c", "d"] {
            journal.append(entry(tag));
        }
        assert_eq!(journal.len(), 3);
        let order: Vec<_> = journal.entries().map(|e| e.sensor_summary.clone()).collect();
        assert_eq!(order, vec!["d", "c", "b"]);
    }

    #[test]
    fn rehydration_reapplies_the_cap_and_keeps_order() {
        let stored = vec![entry("newest"), entry("middle"), entry("oldest")];
        let journal = Journal::from_entries(2, stored);
        let order: Vec<_> = journal.entries().map(|e| e.sensor_summary.clone()).collect();
        assert_eq!(order, vec!["newest", "middle"]);
    }

    #[test]
    fn clear_empties_the_journal() {
        let mut journal = Journal::new(5);
        journal.append(entry("a"));
        journal.clear();
        assert!(journal.is_empty());
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut journal = Journal::new(0);
        journal.append(entry("only"));
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.capacity(), 1);
    }
}
