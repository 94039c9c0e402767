//! Append-only search log.
//!
//! `<library>/.search_index.json` is an ordered list of denormalized entries,
//! one per organized document. It is a lookup aid, not a source of truth:
//! re-analysing a document appends another entry rather than replacing one.

use crate::classify::ClassificationResult;
use crate::config::PathsConfig;
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEntry {
    pub file_path: String,
    pub original_filename: String,
    pub jd_id: String,
    pub jd_area: String,
    pub jd_category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub date_mentioned: Option<String>,
    pub indexed_at: DateTime<Utc>,
    #[serde(default)]
    pub extracted_text: String,
}

impl SearchEntry {
    pub fn new(
        file_path: &Path,
        original_filename: &str,
        jd_id: &str,
        classification: &ClassificationResult,
        extracted_text: &str,
    ) -> Self {
        Self {
            file_path: file_path.to_string_lossy().into_owned(),
            original_filename: original_filename.to_string(),
            jd_id: jd_id.to_string(),
            jd_area: classification.jd_area.clone(),
            jd_category: classification.jd_category.clone(),
            tags: classification.tags.clone(),
            summary: classification.summary.clone(),
            entities: classification.entities.clone(),
            date_mentioned: classification.date_mentioned.clone(),
            indexed_at: Utc::now(),
            extracted_text: extracted_text.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    path: PathBuf,
}

impl SearchIndex {
    pub fn new(library_root: &Path) -> Self {
        Self {
            path: library_root.join(PathsConfig::SEARCH_INDEX_FILENAME),
        }
    }

    /// All entries in insertion order.
    ///
    /// A corrupt file is an error here; appending over it would discard
    /// every earlier entry.
    pub fn entries(&self) -> Result<Vec<SearchEntry>> {
        Ok(atomic_read_json(&self.path)?.unwrap_or_default())
    }

    /// Read the whole log, push `entry`, and write it back.
    pub fn append(&self, entry: SearchEntry) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);
        atomic_write_json(&self.path, &entries, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str) -> SearchEntry {
        let classification =
            ClassificationResult::placement("10-19 Finance", "14 Receipts", "A receipt");
        SearchEntry::new(Path::new(name), "scan.pdf", "14.01", &classification, "text")
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::new(temp_dir.path());

        assert!(index.entries().unwrap().is_empty());
        index.append(entry("a.pdf")).unwrap();
        index.append(entry("b.pdf")).unwrap();
        index.append(entry("a.pdf")).unwrap();

        let paths: Vec<String> = index
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.file_path)
            .collect();
        assert_eq!(paths, vec!["a.pdf", "b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_corrupt_log_is_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".search_index.json");
        std::fs::write(&path, "[{broken").unwrap();

        let index = SearchIndex::new(temp_dir.path());
        assert!(index.append(entry("a.pdf")).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{broken");
    }
}
