//! Review workflow: list, analyze, move and delete documents.

use super::JdexApi;
use crate::classify::{BackendKind, ClassificationResult};
use crate::config::{is_sidecar_name, is_supported_extension, PathsConfig};
use crate::library::{
    read_sidecar, remove_sidecar, sidecar_path, write_sidecar, DocumentRecord, OrganizeOutcome,
    SidecarKind,
};
use crate::{JdexError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// A document as shown to a reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Pending analysis, or the filed metadata when there is none.
    pub analysis: Option<DocumentRecord>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteSummary {
    pub removed: Vec<PathBuf>,
}

impl JdexApi {
    /// Supported documents in `folder` (default: the inbox), newest first.
    ///
    /// Hidden files and sidecars are skipped; hidden directories are not
    /// descended into.
    pub async fn list_files(&self, folder: Option<&Path>, recursive: bool) -> Result<Vec<FileEntry>> {
        let _guard = self.organizer.lock().await;
        let folder = folder
            .map(|f| self.resolve(f))
            .unwrap_or_else(|| self.inbox_dir.clone());
        if !folder.is_dir() {
            return Err(JdexError::NotADirectory(folder));
        }

        let walker = WalkDir::new(&folder)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        let mut files = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let supported = entry
                .path()
                .extension()
                .map(|e| is_supported_extension(&e.to_string_lossy()))
                .unwrap_or(false);
            if !supported || is_sidecar_name(&name) {
                continue;
            }

            let metadata = entry.metadata().ok();
            let path = entry.into_path();
            let analysis = match read_sidecar(&path, SidecarKind::Analysis).ok().flatten() {
                Some(record) => Some(record),
                None => read_sidecar(&path, SidecarKind::Meta).ok().flatten(),
            };
            files.push(FileEntry {
                name,
                size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
                analysis,
                path,
            });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(files)
    }

    /// Analysis of a document, cached in its `.analysis.json` sidecar.
    ///
    /// The cached record is returned unless `force` is set; otherwise the
    /// document is extracted and classified (with `hint` overriding the
    /// configured backend) and the sidecar rewritten.
    pub async fn analyze_file(
        &self,
        path: &Path,
        force: bool,
        hint: Option<BackendKind>,
    ) -> Result<DocumentRecord> {
        let organizer = self.organizer.lock().await;
        let path = self.resolve(path);
        if !path.is_file() {
            return Err(JdexError::FileNotFound(path));
        }

        if !force {
            if let Some(cached) = read_sidecar(&path, SidecarKind::Analysis)? {
                return Ok(cached);
            }
        }

        let record = self
            .analyzer
            .analyze(&path, organizer.taxonomy(), hint)
            .await?;
        write_sidecar(&path, SidecarKind::Analysis, &record)?;
        info!(
            "Analyzed {} as {} / {}",
            path.display(),
            record.classification.jd_area,
            record.classification.jd_category
        );
        Ok(record)
    }

    /// File a document under the reviewer's chosen area and category.
    ///
    /// The existing analysis (or filed metadata) supplies the descriptive
    /// fields; without either a minimal record is used. The pair must exist
    /// in the taxonomy.
    pub async fn move_file(&self, path: &Path, area: &str, category: &str) -> Result<OrganizeOutcome> {
        let mut organizer = self.organizer.lock().await;
        let path = self.resolve(path);
        if !path.is_file() {
            return Err(JdexError::FileNotFound(path));
        }
        if !organizer.taxonomy().contains(area, category) {
            return Err(JdexError::UnknownCategory {
                area: area.to_string(),
                category: category.to_string(),
            });
        }

        let record = match read_sidecar(&path, SidecarKind::Analysis)? {
            Some(record) => record,
            None => read_sidecar(&path, SidecarKind::Meta)?.unwrap_or_default(),
        };
        let mut classification = if record.classification.jd_category.is_empty() {
            ClassificationResult::placement(area, category, "")
        } else {
            record.classification
        };
        classification.jd_area = area.to_string();
        classification.jd_category = category.to_string();

        organizer.organize(&path, &classification, &record.extracted_text)
    }

    /// Delete a document inside the library or inbox, with its sidecars and
    /// hash-index entry.
    pub async fn delete_file(&self, path: &Path) -> Result<DeleteSummary> {
        let mut organizer = self.organizer.lock().await;
        let path = self.resolve(path);
        if !path.is_file() {
            return Err(JdexError::FileNotFound(path));
        }
        if !self.is_managed(&path) {
            return Err(JdexError::InvalidParams {
                message: format!("{} is outside the library", path.display()),
            });
        }
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if name.starts_with(PathsConfig::JDEX_FILENAME) || name.starts_with('.') {
            return Err(JdexError::InvalidParams {
                message: format!("{} is not a document", path.display()),
            });
        }

        let mut summary = DeleteSummary::default();
        std::fs::remove_file(&path).map_err(|e| JdexError::io_with_path(e, &path))?;
        summary.removed.push(path.clone());
        for kind in [SidecarKind::Meta, SidecarKind::Analysis] {
            if remove_sidecar(&path, kind)? {
                summary.removed.push(sidecar_path(&path, kind));
            }
        }

        if organizer.duplicate_index_mut().remove_path(&path) > 0 {
            organizer.duplicate_index().save()?;
        }
        info!("Deleted {}", path.display());
        Ok(summary)
    }
}
