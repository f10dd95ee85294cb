//! Session history log
//!
//! Human readable status lines shown to the user. Append-only except for
//! `reset`, which goes back to the single initial entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_ENTRY: &str = "Initialized...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl HistoryEntry {
    fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            entries: vec![HistoryEntry::now(INITIAL_ENTRY)],
        }
    }

    pub fn push(&mut self, message: impl Into<String>) -> &HistoryEntry {
        let entry = HistoryEntry::now(message);
        tracing::debug!("history: {}", entry.message);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn reset(&mut self) {
        self.entries = vec![HistoryEntry::now(INITIAL_ENTRY)];
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_initial_entry() {
        let log = HistoryLog::new();
        assert_eq!(log.messages(), vec![INITIAL_ENTRY]);
    }

    #[test]
    fn test_reset_returns_to_initial_entry() {
        let mut log = HistoryLog::new();
        log.push("Recording started");
        log.push("Recorded...: 1s");
        assert_eq!(log.entries().len(), 3);

        log.reset();
        assert_eq!(log.messages(), vec![INITIAL_ENTRY]);
    }
}
