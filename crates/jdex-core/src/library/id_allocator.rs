//! Stable per-category document identifiers.
//!
//! State lives in `<library>/.jd_ids.json`:
//!
//! ```json
//! { "14 Receipts": { "next_id": 3, "mappings": { "Amazon_2024": "14.01", "IKEA_2024": "14.02" } } }
//! ```
//!
//! A key that was seen before always gets its old identifier back. New keys
//! take the category's counter, which only ever grows. The state is persisted
//! before an identifier is returned, so a retry after a crash sees the same
//! mapping.

use crate::config::PathsConfig;
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::taxonomy::category_prefix;
use crate::{JdexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Allocation state of one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryIds {
    pub next_id: u32,
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

impl Default for CategoryIds {
    fn default() -> Self {
        Self {
            next_id: 1,
            mappings: BTreeMap::new(),
        }
    }
}

/// Allocation key for an issuer/year pair. Not case-folded.
pub fn allocation_key(issuer: &str, year: &str) -> String {
    format!("{issuer}_{year}")
}

#[derive(Debug)]
pub struct IdAllocator {
    path: PathBuf,
    state: BTreeMap<String, CategoryIds>,
}

impl IdAllocator {
    /// Load the allocator state of a library. A missing file is empty state;
    /// a corrupt one is an error, since silently restarting counters would
    /// reissue identifiers.
    pub fn open(library_root: &Path) -> Result<Self> {
        let path = library_root.join(PathsConfig::ID_STATE_FILENAME);
        let state = atomic_read_json(&path)?.unwrap_or_default();
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// State of one category, if any identifier was issued in it.
    pub fn category(&self, category: &str) -> Option<&CategoryIds> {
        self.state.get(category)
    }

    /// Identifier for `(category, issuer, year)`.
    ///
    /// Idempotent for a known key. Otherwise formats `"<NN>.<counter:02>"`,
    /// records it, advances the counter and persists the whole state.
    pub fn allocate(&mut self, category: &str, issuer: &str, year: &str) -> Result<String> {
        let prefix = category_prefix(category).ok_or_else(|| JdexError::InvalidParams {
            message: format!("Category '{}' has no two-digit number", category),
        })?;
        let key = allocation_key(issuer, year);

        if let Some(existing) = self.state.get(category).and_then(|c| c.mappings.get(&key)) {
            debug!("Reusing {} for {} in {}", existing, key, category);
            return Ok(existing.clone());
        }

        let mut updated = self.state.clone();
        let entry = updated.entry(category.to_string()).or_default();
        let jd_id = format!("{}.{:02}", prefix, entry.next_id);
        entry.mappings.insert(key.clone(), jd_id.clone());
        entry.next_id += 1;

        atomic_write_json(&self.path, &updated, false)?;
        self.state = updated;

        info!("Allocated {} for {} in {}", jd_id, key, category);
        Ok(jd_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_same_key_same_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();

        let first = ids.allocate("14 Receipts", "Amazon", "2024").unwrap();
        let second = ids.allocate("14 Receipts", "Amazon", "2024").unwrap();
        assert_eq!(first, "14.01");
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_issuer_or_year() {
        let temp_dir = TempDir::new().unwrap();
        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();

        let amazon = ids.allocate("14 Receipts", "Amazon", "2024").unwrap();
        let ikea = ids.allocate("14 Receipts", "IKEA", "2024").unwrap();
        let amazon_2023 = ids.allocate("14 Receipts", "Amazon", "2023").unwrap();

        assert_ne!(amazon, ikea);
        assert_ne!(amazon, amazon_2023);
        assert!(ikea.starts_with("14."));
        assert_eq!(vec![amazon, ikea, amazon_2023], vec!["14.01", "14.02", "14.03"]);
    }

    #[test]
    fn test_issuer_case_is_significant() {
        let temp_dir = TempDir::new().unwrap();
        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();

        let upper = ids.allocate("14 Receipts", "Amazon", "2024").unwrap();
        let lower = ids.allocate("14 Receipts", "amazon", "2024").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_categories_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();

        assert_eq!(ids.allocate("14 Receipts", "Amazon", "2024").unwrap(), "14.01");
        assert_eq!(ids.allocate("11 Banking", "Amazon", "2024").unwrap(), "11.01");
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut ids = IdAllocator::open(temp_dir.path()).unwrap();
            ids.allocate("14 Receipts", "Amazon", "2024").unwrap();
        }

        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();
        assert_eq!(ids.category("14 Receipts").unwrap().next_id, 2);
        assert_eq!(ids.allocate("14 Receipts", "Amazon", "2024").unwrap(), "14.01");
        assert_eq!(ids.allocate("14 Receipts", "IKEA", "2024").unwrap(), "14.02");
    }

    #[test]
    fn test_reads_existing_state_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(".jd_ids.json"),
            r#"{"14 Receipts": {"next_id": 7, "mappings": {"Amazon_2024": "14.03"}}}"#,
        )
        .unwrap();

        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();
        assert_eq!(ids.allocate("14 Receipts", "Amazon", "2024").unwrap(), "14.03");
        assert_eq!(ids.allocate("14 Receipts", "Bahn", "2024").unwrap(), "14.07");
    }

    #[test]
    fn test_category_without_number_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut ids = IdAllocator::open(temp_dir.path()).unwrap();
        assert!(ids.allocate("Receipts", "Amazon", "2024").is_err());
    }
}
