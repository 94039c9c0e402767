//! Content-hash index over the whole library.
//!
//! `<library>/.hash_index.json` maps a SHA-256 digest to the path (relative to
//! the library root) of the one filed document with that content. Entries whose
//! file disappeared are pruned lazily on lookup and eagerly on rebuild.

use super::hashing::hash_file;
use crate::config::{is_sidecar_name, IngestConfig, PathsConfig};
use crate::metadata::{atomic_write_json, read_json_or_default};
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Counts from one rebuild pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    /// Files hashed during the walk.
    pub scanned: usize,
    /// Entries in the index afterwards.
    pub indexed: usize,
    /// Entries dropped because their content was not seen.
    pub pruned: usize,
    /// Files that could not be read.
    pub errors: usize,
}

#[derive(Debug)]
pub struct DuplicateIndex {
    library_root: PathBuf,
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DuplicateIndex {
    /// Load the index of a library. The index is re-derivable, so a corrupt
    /// file is logged and treated as empty.
    pub fn open(library_root: &Path) -> Self {
        let path = library_root.join(PathsConfig::HASH_INDEX_FILENAME);
        let entries = read_json_or_default(&path);
        Self {
            library_root: library_root.to_path_buf(),
            path,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All indexed hashes, in order.
    pub fn hashes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Path of the filed document with this content.
    ///
    /// An entry whose file no longer exists is removed and `None` returned.
    pub fn lookup(&mut self, hash: &str) -> Option<PathBuf> {
        let recorded = self.entries.get(hash)?;
        let absolute = self.library_root.join(recorded);
        if absolute.is_file() {
            return Some(absolute);
        }
        debug!("Pruning stale hash entry {} -> {}", hash, recorded);
        self.entries.remove(hash);
        None
    }

    /// Record `path` as the canonical copy of `hash`.
    pub fn insert(&mut self, hash: impl Into<String>, path: &Path) {
        let stored = match path.strip_prefix(&self.library_root) {
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        };
        self.entries.insert(hash.into(), stored);
    }

    /// Drop every entry pointing at `path`. Returns how many were removed.
    pub fn remove_path(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        let root = self.library_root.clone();
        self.entries.retain(|_, recorded| root.join(recorded.as_str()) != path);
        before - self.entries.len()
    }

    pub fn save(&self) -> Result<()> {
        atomic_write_json(&self.path, &self.entries, false)
    }

    /// Re-hash every document under the library root and persist the result.
    ///
    /// Hidden files, sidecars, the taxonomy document, the quarantine directory
    /// and the `inbox` subtree are skipped. With `fresh` the index starts
    /// empty; otherwise existing entries whose file still matches are kept.
    /// Hashes not observed during the walk are removed either way.
    pub fn rebuild(&mut self, inbox: Option<&Path>, fresh: bool) -> Result<RebuildSummary> {
        let mut summary = RebuildSummary::default();
        let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let inbox = inbox.map(canonical);

        let walker = WalkDir::new(&self.library_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e, inbox.as_deref()));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_indexable_file(&entry) {
                continue;
            }

            match hash_file(entry.path()) {
                Ok(hash) => {
                    summary.scanned += 1;
                    let relative = entry
                        .path()
                        .strip_prefix(&self.library_root)
                        .unwrap_or(entry.path())
                        .to_string_lossy()
                        .into_owned();
                    seen.entry(hash).or_default().push(relative);
                }
                Err(e) => {
                    summary.errors += 1;
                    warn!("Failed to hash {}: {}", entry.path().display(), e);
                }
            }
        }

        let previous = std::mem::take(&mut self.entries);
        let observed: HashSet<&String> = seen.keys().collect();
        summary.pruned = previous.keys().filter(|h| !observed.contains(h)).count();

        let mut rebuilt = BTreeMap::new();
        for (hash, paths) in seen {
            // Keep the recorded path when it still holds this content.
            let kept = previous
                .get(&hash)
                .filter(|recorded| !fresh && paths.contains(recorded))
                .cloned();
            if let Some(path) = kept.or_else(|| paths.into_iter().next()) {
                rebuilt.insert(hash, path);
            }
        }

        self.entries = rebuilt;
        summary.indexed = self.entries.len();
        self.save()?;

        info!(
            "Rebuilt hash index: {} files scanned, {} indexed, {} pruned",
            summary.scanned, summary.indexed, summary.pruned
        );
        Ok(summary)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_skipped_dir(entry: &DirEntry, inbox: Option<&Path>) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    if is_hidden(entry) || entry.file_name() == IngestConfig::FAILED_DIR_NAME {
        return true;
    }
    inbox.is_some_and(|inbox| canonical(entry.path()) == inbox)
}

/// Resolved form of `path` so differently spelled paths compare equal.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn is_indexable_file(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    !is_hidden(entry)
        && !is_sidecar_name(&name)
        && !name.starts_with(PathsConfig::JDEX_FILENAME)
}
