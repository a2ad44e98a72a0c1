use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One accepted builder text and the SQL it compiled to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub sql: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sql: sql.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryHistory {
    entries: Vec<HistoryEntry>,
    #[serde(skip)]
    current_index: Option<usize>,
    max_entries: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

impl QueryHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            current_index: None,
            max_entries: max_entries.max(1),
        }
    }

    pub fn add(&mut self, entry: HistoryEntry) {
        // Don't add duplicate consecutive entries
        if let Some(last) = self.entries.last() {
            if last.text.trim() == entry.text.trim() {
                return;
            }
        }

        self.entries.push(entry);

        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }

        self.current_index = None;
    }

    pub fn previous(&mut self) -> Option<&HistoryEntry> {
        if self.entries.is_empty() {
            return None;
        }

        let idx = match self.current_index {
            Some(i) if i > 0 => i - 1,
            Some(i) => i,
            None => self.entries.len() - 1,
        };

        self.current_index = Some(idx);
        self.entries.get(idx)
    }

    pub fn next(&mut self) -> Option<&HistoryEntry> {
        if self.entries.is_empty() {
            return None;
        }

        let idx = match self.current_index {
            Some(i) if i < self.entries.len() - 1 => i + 1,
            Some(i) => i,
            None => return None,
        };

        self.current_index = Some(idx);
        self.entries.get(idx)
    }

    pub fn reset_navigation(&mut self) {
        self.current_index = None;
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over builder texts.
    pub fn search(&self, needle: &str) -> Vec<&HistoryEntry> {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn history_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("xql")
            .join("history.json")
    }

    pub fn load_from(path: &Path, max_entries: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(max_entries));
        }
        let content = std::fs::read_to_string(path)?;
        let mut history: QueryHistory = serde_json::from_str(&content)?;
        history.max_entries = max_entries.max(1);
        if history.entries.len() > history.max_entries {
            let excess = history.entries.len() - history.max_entries;
            history.entries.drain(..excess);
        }
        Ok(history)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry::new(text, "SELECT 1")
    }

    #[test]
    fn test_skips_consecutive_duplicates() {
        let mut history = QueryHistory::new(10);
        history.add(entry("XQL.from(\"a\")"));
        history.add(entry("  XQL.from(\"a\")\n"));
        history.add(entry("XQL.from(\"b\")"));
        history.add(entry("XQL.from(\"a\")"));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_trims_to_max_entries() {
        let mut history = QueryHistory::new(2);
        history.add(entry("one"));
        history.add(entry("two"));
        history.add(entry("three"));
        let texts: Vec<&str> = history.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn test_navigation() {
        let mut history = QueryHistory::new(10);
        assert!(history.previous().is_none());
        history.add(entry("one"));
        history.add(entry("two"));
        history.add(entry("three"));

        assert!(history.next().is_none());
        assert_eq!(history.previous().unwrap().text, "three");
        assert_eq!(history.previous().unwrap().text, "two");
        assert_eq!(history.previous().unwrap().text, "one");
        assert_eq!(history.previous().unwrap().text, "one");
        assert_eq!(history.next().unwrap().text, "two");

        history.reset_navigation();
        assert_eq!(history.previous().unwrap().text, "three");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut history = QueryHistory::new(10);
        history.add(entry("XQL.from(\"Penguins\")"));
        history.add(entry("XQL.from(\"flights\")"));
        assert_eq!(history.search("penguins").len(), 1);
        assert_eq!(history.search("XQL").len(), 2);
        assert!(history.search("trains").is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("xql-history-test-{}", std::process::id()))
            .join("history.json");
        let mut history = QueryHistory::new(10);
        history.add(entry("one"));
        history.add(entry("two"));
        history.add(entry("three"));
        history.save_to(&path).unwrap();

        let loaded = QueryHistory::load_from(&path, 2).unwrap();
        let texts: Vec<&str> = loaded.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }
}
