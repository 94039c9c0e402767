//! Processed-file ledger.
//!
//! `<library>/.processed_files.json` remembers every content hash the ingest
//! loop has filed, so the same bytes dropped into the inbox again are
//! recognised without re-running extraction and classification.

use crate::config::PathsConfig;
use crate::metadata::{atomic_write_json, read_json_or_default};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub original_name: String,
    pub destination: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ProcessedLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl ProcessedLedger {
    pub fn open(library_root: &Path) -> Self {
        let path = library_root.join(PathsConfig::LEDGER_FILENAME);
        let entries = read_json_or_default(&path);
        Self { path, entries }
    }

    pub fn get(&self, hash: &str) -> Option<&LedgerEntry> {
        self.entries.get(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or replace the entry for `hash`. Call [`save`](Self::save) to persist.
    pub fn record(&mut self, hash: impl Into<String>, original_name: &str, destination: &Path) {
        self.entries.insert(
            hash.into(),
            LedgerEntry {
                original_name: original_name.to_string(),
                destination: destination.to_string_lossy().into_owned(),
                processed_at: Utc::now(),
            },
        );
    }

    pub fn save(&self) -> Result<()> {
        atomic_write_json(&self.path, &self.entries, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut ledger = ProcessedLedger::open(root);
        assert!(ledger.is_empty());
        ledger.record("abc", "scan.pdf", &root.join("10-19 Finance/14 Receipts/x.pdf"));
        ledger.save().unwrap();

        let reopened = ProcessedLedger::open(root);
        assert!(reopened.contains("abc"));
        let entry = reopened.get("abc").unwrap();
        assert_eq!(entry.original_name, "scan.pdf");
        assert!(entry.destination.ends_with("x.pdf"));
    }

    #[test]
    fn test_corrupt_ledger_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".processed_files.json"), "not json").unwrap();

        let ledger = ProcessedLedger::open(temp_dir.path());
        assert_eq!(ledger.len(), 0);
    }
}
