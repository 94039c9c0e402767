//! The persisted taxonomy document (`jdex.json`).
//!
//! Mutations are applied to a copy, the copy is validated as a whole, and
//! only then is it swapped in and written. An invalid change never touches
//! disk.

use super::templates;
use super::{validate, Area, Category, Taxonomy};
use crate::classify::Confidence;
use crate::config::PathsConfig;
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::{JdexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Documents between taxonomy review milestones.
const MILESTONE_STEP: u64 = 100;

/// How a taxonomy came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Template,
    #[default]
    Manual,
    Migration,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdexMeta {
    pub version: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub generation_method: Option<GenerationMethod>,
    pub user_context: BTreeMap<String, String>,
}

impl Default for JdexMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            created_at: None,
            last_modified: None,
            generation_method: None,
            user_context: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evolution {
    pub total_documents: u64,
    pub last_review: Option<DateTime<Utc>>,
    pub next_milestone: u64,
    pub pending_suggestions: Vec<serde_json::Value>,
    pub history: Vec<HistoryEntry>,
}

impl Default for Evolution {
    fn default() -> Self {
        Self {
            total_documents: 0,
            last_review: None,
            next_milestone: MILESTONE_STEP,
            pending_suggestions: Vec::new(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationStats {
    pub by_category: BTreeMap<String, ConfidenceCounts>,
}

/// The full `jdex.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdexDocument {
    pub meta: JdexMeta,
    pub areas: Taxonomy,
    pub evolution: Evolution,
    pub classification_stats: ClassificationStats,
}

impl JdexDocument {
    fn push_history(&mut self, action: &str, details: String, trigger: &str) {
        self.evolution.history.push(HistoryEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            details,
            trigger: trigger.to_string(),
        });
    }
}

/// Loads, mutates and persists the taxonomy document of one library.
#[derive(Debug)]
pub struct TaxonomyStore {
    library_root: PathBuf,
    path: PathBuf,
    document: JdexDocument,
    exists: bool,
}

impl TaxonomyStore {
    /// Open the taxonomy of a library.
    ///
    /// Reads `<root>/jdex.json`, falling back to the legacy
    /// `00-09 System/00 Index/jdex.json`. With neither present the built-in
    /// default template is in effect until something is saved.
    pub fn open(library_root: impl Into<PathBuf>) -> Result<Self> {
        let library_root = library_root.into();
        let path = library_root.join(PathsConfig::JDEX_FILENAME);
        let legacy = library_root.join(PathsConfig::LEGACY_JDEX_PATH);

        for candidate in [&path, &legacy] {
            if let Some(document) = atomic_read_json::<JdexDocument>(candidate)? {
                debug!("Loaded taxonomy from {}", candidate.display());
                return Ok(Self {
                    library_root,
                    path: candidate.clone(),
                    document,
                    exists: true,
                });
            }
        }

        let document = JdexDocument {
            meta: JdexMeta {
                generation_method: Some(GenerationMethod::Default),
                ..Default::default()
            },
            areas: templates::default_taxonomy(),
            ..Default::default()
        };
        Ok(Self {
            library_root,
            path,
            document,
            exists: false,
        })
    }

    /// True when a taxonomy document exists on disk.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub fn document(&self) -> &JdexDocument {
        &self.document
    }

    /// The effective taxonomy.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.document.areas
    }

    /// Stamp `last_modified` and write the document atomically.
    pub fn save(&mut self) -> Result<()> {
        self.document.meta.last_modified = Some(Utc::now());
        atomic_write_json(&self.path, &self.document, true)?;
        self.exists = true;
        Ok(())
    }

    /// Replace the whole taxonomy with a validated structure.
    pub fn create_from_structure(
        &mut self,
        areas: Taxonomy,
        method: GenerationMethod,
        user_context: BTreeMap<String, String>,
    ) -> Result<()> {
        validate(&areas).into_result()?;

        let now = Utc::now();
        let mut document = JdexDocument {
            meta: JdexMeta {
                created_at: Some(now),
                last_modified: Some(now),
                generation_method: Some(method),
                user_context,
                ..Default::default()
            },
            areas,
            ..Default::default()
        };
        let method_name = serde_json::to_value(method)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        document.push_history(
            "system_created",
            format!("Created via {method_name}"),
            "initial_setup",
        );

        self.document = document;
        self.save()?;
        info!(
            "Created taxonomy with {} areas at {}",
            self.document.areas.areas().len(),
            self.path.display()
        );
        Ok(())
    }

    /// Add an area. Rejected wholesale if the result would be invalid.
    pub fn add_area(
        &mut self,
        name: &str,
        description: &str,
        categories: BTreeMap<String, Category>,
        reason: &str,
    ) -> Result<()> {
        if self.document.areas.area(name).is_some() {
            return Err(JdexError::Validation {
                violations: vec![format!("Area already exists: {name}")],
            });
        }

        let mut candidate = self.document.clone();
        candidate.areas.areas_mut().insert(
            name.to_string(),
            Area {
                description: description.to_string(),
                categories,
            },
        );
        validate(&candidate.areas).into_result()?;
        candidate.push_history("area_added", format!("Added area '{name}'"), reason);

        self.document = candidate;
        self.save()
    }

    /// Add a category to an existing area. Rejected wholesale if the result
    /// would be invalid.
    pub fn add_category(
        &mut self,
        area: &str,
        name: &str,
        description: &str,
        keywords: Vec<String>,
        reason: &str,
    ) -> Result<()> {
        let mut candidate = self.document.clone();
        let target = candidate
            .areas
            .areas_mut()
            .get_mut(area)
            .ok_or_else(|| JdexError::Validation {
                violations: vec![format!("Area not found: {area}")],
            })?;
        if target.categories.contains_key(name) {
            return Err(JdexError::Validation {
                violations: vec![format!("Category already exists: {name} in {area}")],
            });
        }
        target.categories.insert(
            name.to_string(),
            Category {
                description: description.to_string(),
                keywords,
                ..Default::default()
            },
        );
        validate(&candidate.areas).into_result()?;
        candidate.push_history(
            "category_added",
            format!("Added '{name}' to {area}"),
            reason,
        );

        self.document = candidate;
        self.save()
    }

    /// Update usage statistics after a document was filed. Not persisted
    /// until [`save`](Self::save).
    pub fn record_classification(&mut self, area: &str, category: &str, confidence: Confidence, document: &str) {
        let counts = self
            .document
            .classification_stats
            .by_category
            .entry(category.to_string())
            .or_default();
        match confidence {
            Confidence::High => counts.high += 1,
            Confidence::Medium => counts.medium += 1,
            Confidence::Low => counts.low += 1,
        }

        let evolution = &mut self.document.evolution;
        evolution.total_documents += 1;
        if evolution.total_documents >= evolution.next_milestone {
            evolution.next_milestone += MILESTONE_STEP;
            info!(
                "Library reached {} documents; taxonomy review suggested",
                evolution.total_documents
            );
        }

        if let Some(def) = self.document.areas.category_mut(area, category) {
            def.document_count += 1;
            def.last_document = Some(document.to_string());
        }
    }

    /// Create `Area/Category/` directories for the whole taxonomy.
    pub fn create_folders(&self) -> Result<()> {
        for category in self.document.areas.categories() {
            let dir = self.library_root.join(category.area).join(category.category);
            std::fs::create_dir_all(&dir).map_err(|e| JdexError::io_with_path(e, &dir))?;
        }
        // Areas without categories still get their folder.
        for area in self.document.areas.areas().keys() {
            let dir = self.library_root.join(area);
            std::fs::create_dir_all(&dir).map_err(|e| JdexError::io_with_path(e, &dir))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_taxonomy() -> Taxonomy {
        Taxonomy::new()
            .with_area("00-09 System", "", &[("01 Inbox", &[])])
            .with_area("10-19 Finance", "", &[("14 Receipts", &["receipt"])])
    }

    #[test]
    fn test_missing_document_uses_default_template() {
        let temp_dir = TempDir::new().unwrap();
        let store = TaxonomyStore::open(temp_dir.path()).unwrap();
        assert!(!store.exists());
        assert!(store.taxonomy().contains("10-19 Finance", "14 Receipts"));
        assert!(!temp_dir.path().join("jdex.json").exists());
    }

    #[test]
    fn test_create_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        store
            .create_from_structure(small_taxonomy(), GenerationMethod::Manual, BTreeMap::new())
            .unwrap();

        let reopened = TaxonomyStore::open(temp_dir.path()).unwrap();
        assert!(reopened.exists());
        assert_eq!(reopened.taxonomy(), &small_taxonomy());
        let history = &reopened.document().evolution.history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "system_created");
        assert_eq!(history[0].details, "Created via manual");
    }

    #[test]
    fn test_legacy_location_is_read() {
        let temp_dir = TempDir::new().unwrap();
        let legacy = temp_dir.path().join("00-09 System/00 Index/jdex.json");
        let document = JdexDocument {
            areas: small_taxonomy(),
            ..Default::default()
        };
        atomic_write_json(&legacy, &document, false).unwrap();

        let store = TaxonomyStore::open(temp_dir.path()).unwrap();
        assert!(store.exists());
        assert_eq!(store.path(), legacy.as_path());
        assert_eq!(store.taxonomy(), &small_taxonomy());
    }

    #[test]
    fn test_invalid_structure_rejected_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        let bad = Taxonomy::new().with_area("10-19 Finance", "", &[("25 Elsewhere", &[])]);

        let err = store
            .create_from_structure(bad, GenerationMethod::Manual, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, JdexError::Validation { .. }));
        assert!(!temp_dir.path().join("jdex.json").exists());
    }

    #[test]
    fn test_add_category_validated_wholesale() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        store
            .create_from_structure(small_taxonomy(), GenerationMethod::Template, BTreeMap::new())
            .unwrap();

        store
            .add_category("10-19 Finance", "17 Crypto", "", vec!["bitcoin".into()], "manual")
            .unwrap();
        assert!(store.taxonomy().contains("10-19 Finance", "17 Crypto"));

        let err = store
            .add_category("10-19 Finance", "27 Wrong", "", vec![], "manual")
            .unwrap_err();
        match err {
            JdexError::Validation { violations } => {
                assert_eq!(violations, vec!["Category 27 Wrong outside range for 10-19 Finance"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!store.taxonomy().contains("10-19 Finance", "27 Wrong"));

        let reopened = TaxonomyStore::open(temp_dir.path()).unwrap();
        assert!(reopened.taxonomy().contains("10-19 Finance", "17 Crypto"));
        assert!(!reopened.taxonomy().contains("10-19 Finance", "27 Wrong"));
    }

    #[test]
    fn test_add_area_rejects_used_range() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        store
            .create_from_structure(small_taxonomy(), GenerationMethod::Manual, BTreeMap::new())
            .unwrap();

        store
            .add_area("60-69 Hobbies", "Fun", BTreeMap::new(), "manual")
            .unwrap();
        let err = store
            .add_area("10-19 Money", "", BTreeMap::new(), "manual")
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate area range"));
        assert_eq!(store.document().evolution.history.len(), 2);
    }

    #[test]
    fn test_record_classification_updates_stats() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        store.record_classification("10-19 Finance", "14 Receipts", Confidence::Medium, "14.01 Amazon 2024.pdf");
        store.record_classification("10-19 Finance", "14 Receipts", Confidence::Low, "14.02 Ikea 2024.pdf");

        let doc = store.document();
        let counts = doc.classification_stats.by_category["14 Receipts"];
        assert_eq!((counts.high, counts.medium, counts.low), (0, 1, 1));
        assert_eq!(doc.evolution.total_documents, 2);
        let receipts = &doc.areas.area("10-19 Finance").unwrap().categories["14 Receipts"];
        assert_eq!(receipts.document_count, 2);
        assert_eq!(receipts.last_document.as_deref(), Some("14.02 Ikea 2024.pdf"));
    }

    #[test]
    fn test_milestone_advances() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = TaxonomyStore::open(temp_dir.path()).unwrap();
        for _ in 0..100 {
            store.record_classification("10-19 Finance", "11 Banking", Confidence::High, "x");
        }
        assert_eq!(store.document().evolution.next_milestone, 200);
    }

    #[test]
    fn test_create_folders() {
        let temp_dir = TempDir::new().unwrap();
        let store = TaxonomyStore::open(temp_dir.path()).unwrap();
        store.create_folders().unwrap();
        assert!(temp_dir.path().join("10-19 Finance/14 Receipts").is_dir());
        assert!(temp_dir.path().join("00-09 System/01 Inbox").is_dir());
    }
}
