//! Per-document JSON sidecars.
//!
//! A filed document `X.pdf` carries `X.pdf.meta.json`; a document analysed in
//! place but not yet moved carries `X.pdf.analysis.json`. Both hold the same
//! record: the classification fields at top level, plus provenance and the
//! extracted text.

use crate::classify::ClassificationResult;
use crate::config::PathsConfig;
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::{JdexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarKind {
    /// Written by the organizer next to a filed document.
    Meta,
    /// Written by preprocess/analyze next to an unfiled document.
    Analysis,
}

impl SidecarKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            SidecarKind::Meta => PathsConfig::META_SIDECAR_SUFFIX,
            SidecarKind::Analysis => PathsConfig::ANALYSIS_SIDECAR_SUFFIX,
        }
    }
}

/// Sidecar path for `document`: the full file name plus the kind's suffix.
pub fn sidecar_path(document: &Path, kind: SidecarKind) -> PathBuf {
    let mut name: OsString = document.file_name().map(OsString::from).unwrap_or_default();
    name.push(kind.suffix());
    document.with_file_name(name)
}

/// Everything known about one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jd_id: Option<String>,
    pub original_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(flatten)]
    pub classification: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organized_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extraction_metadata: BTreeMap<String, Value>,
    pub extracted_text: String,
}

impl DocumentRecord {
    /// Record of a fresh analysis of `original_filename`.
    pub fn analysis(
        original_filename: &str,
        classification: ClassificationResult,
        extracted_text: &str,
    ) -> Self {
        Self {
            original_filename: original_filename.to_string(),
            classification,
            analyzed_at: Some(Utc::now()),
            extracted_text: extracted_text.to_string(),
            ..Default::default()
        }
    }
}

/// Read a document's sidecar, `None` if it has none.
pub fn read_sidecar(document: &Path, kind: SidecarKind) -> Result<Option<DocumentRecord>> {
    atomic_read_json(&sidecar_path(document, kind))
}

/// Write a document's sidecar, returning its path.
pub fn write_sidecar(document: &Path, kind: SidecarKind, record: &DocumentRecord) -> Result<PathBuf> {
    let path = sidecar_path(document, kind);
    atomic_write_json(&path, record, false)?;
    Ok(path)
}

/// Remove a document's sidecar if present. Returns whether one was removed.
pub fn remove_sidecar(document: &Path, kind: SidecarKind) -> Result<bool> {
    let path = sidecar_path(document, kind);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(JdexError::io_with_path(e, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Confidence;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_paths() {
        let doc = Path::new("/lib/10-19 Finance/14 Receipts/14.01 Amazon 2024.pdf");
        assert_eq!(
            sidecar_path(doc, SidecarKind::Meta),
            Path::new("/lib/10-19 Finance/14 Receipts/14.01 Amazon 2024.pdf.meta.json")
        );
        assert_eq!(
            sidecar_path(Path::new("scan.pdf"), SidecarKind::Analysis),
            Path::new("scan.pdf.analysis.json")
        );
    }

    #[test]
    fn test_classification_fields_are_top_level() {
        let temp_dir = TempDir::new().unwrap();
        let doc = temp_dir.path().join("scan.pdf");

        let mut classification =
            ClassificationResult::placement("10-19 Finance", "14 Receipts", "A receipt");
        classification.confidence = Confidence::Medium;
        let mut record = DocumentRecord::analysis("scan.pdf", classification, "receipt text");
        record.jd_id = Some("14.01".to_string());

        let path = write_sidecar(&doc, SidecarKind::Meta, &record).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(raw["jd_category"], "14 Receipts");
        assert_eq!(raw["confidence"], "medium");
        assert_eq!(raw["jd_id"], "14.01");

        let back = read_sidecar(&doc, SidecarKind::Meta).unwrap().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_remove_missing_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let doc = temp_dir.path().join("scan.pdf");
        assert!(read_sidecar(&doc, SidecarKind::Analysis).unwrap().is_none());
        assert!(!remove_sidecar(&doc, SidecarKind::Analysis).unwrap());
    }
}
