//! Files a classified document into the library.
//!
//! The order of operations matters. Everything up to and including choosing
//! the destination name leaves the source untouched, so a failure there
//! changes nothing observable. Once the bytes have moved, the remaining
//! bookkeeping (sidecar, search log, hash index, taxonomy statistics) is
//! best-effort: failures become warnings on the outcome, never a rollback.

use super::duplicate_index::DuplicateIndex;
use super::hashing::hash_file;
use super::id_allocator::IdAllocator;
use super::naming;
use super::search_index::{SearchEntry, SearchIndex};
use super::sidecar::{remove_sidecar, write_sidecar, DocumentRecord, SidecarKind};
use crate::classify::ClassificationResult;
use crate::taxonomy::{
    category_belongs_to_area, is_valid_area_name, is_valid_category_name, Taxonomy, TaxonomyStore,
};
use crate::{JdexError, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of filing one document.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizeOutcome {
    pub destination: PathBuf,
    pub jd_id: String,
    pub hash: String,
    /// Non-fatal bookkeeping failures after the move.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The library's single writer for filed documents and their indexes.
#[derive(Debug)]
pub struct Organizer {
    library_root: PathBuf,
    inbox_dir: Option<PathBuf>,
    taxonomy: TaxonomyStore,
    ids: IdAllocator,
    hashes: DuplicateIndex,
    search: SearchIndex,
}

impl Organizer {
    /// Open every persisted document of a library.
    pub fn open(library_root: impl Into<PathBuf>) -> Result<Self> {
        let library_root = library_root.into();
        std::fs::create_dir_all(&library_root)
            .map_err(|e| JdexError::io_with_path(e, &library_root))?;

        Ok(Self {
            taxonomy: TaxonomyStore::open(&library_root)?,
            ids: IdAllocator::open(&library_root)?,
            hashes: DuplicateIndex::open(&library_root),
            search: SearchIndex::new(&library_root),
            inbox_dir: None,
            library_root,
        })
    }

    /// Refuse destinations inside `inbox_dir`; a document filed there would be
    /// picked up again by the next scan.
    pub fn with_inbox(mut self, inbox_dir: impl Into<PathBuf>) -> Self {
        self.inbox_dir = Some(inbox_dir.into());
        self
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub fn inbox_dir(&self) -> Option<&Path> {
        self.inbox_dir.as_deref()
    }

    /// The effective taxonomy.
    pub fn taxonomy(&self) -> &Taxonomy {
        self.taxonomy.taxonomy()
    }

    pub fn taxonomy_store(&self) -> &TaxonomyStore {
        &self.taxonomy
    }

    pub fn taxonomy_store_mut(&mut self) -> &mut TaxonomyStore {
        &mut self.taxonomy
    }

    pub fn duplicate_index(&self) -> &DuplicateIndex {
        &self.hashes
    }

    pub fn duplicate_index_mut(&mut self) -> &mut DuplicateIndex {
        &mut self.hashes
    }

    /// Filed path of content with this hash, if any, other than `source`
    /// itself. A stale entry met on the way is pruned and the index saved.
    pub fn find_duplicate(&mut self, hash: &str, source: &Path) -> Option<PathBuf> {
        let before = self.hashes.len();
        let existing = self.hashes.lookup(hash);
        if self.hashes.len() < before {
            if let Err(e) = self.hashes.save() {
                warn!("Failed to save hash index after pruning: {}", e);
            }
        }
        existing.filter(|existing| !same_file(existing, source))
    }

    /// Move `source` into `<root>/<area>/<category>/` under a generated name.
    ///
    /// Fails with [`JdexError::Duplicate`] when the content is already filed
    /// elsewhere; the caller is responsible for removing the source then.
    pub fn organize(
        &mut self,
        source: &Path,
        classification: &ClassificationResult,
        extracted_text: &str,
    ) -> Result<OrganizeOutcome> {
        // 1-2. Hash and duplicate check.
        let hash = hash_file(source)?;
        if let Some(existing) = self.hashes.lookup(&hash) {
            if !same_file(&existing, source) {
                return Err(JdexError::Duplicate { hash, existing });
            }
            // Re-filing a document that is already in the library.
            debug!("Re-filing {}", source.display());
        }

        let area = classification.jd_area.as_str();
        let category = classification.jd_category.as_str();
        let dest_dir = self.destination_dir(area, category)?;

        let original_filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // 3-4. Descriptor and year.
        let descriptor = naming::descriptor(
            &classification.issuer,
            &classification.document_type,
            &original_filename,
        );
        let year = naming::year_or_current(classification.date_mentioned.as_deref());

        // 5. Identifier, persisted before use.
        let jd_id = self.ids.allocate(category, &descriptor, &year)?;

        // 6. Destination.
        std::fs::create_dir_all(&dest_dir).map_err(|e| JdexError::io_with_path(e, &dest_dir))?;
        let file_name =
            naming::build_filename(&jd_id, &descriptor, &year, &naming::extension_of(source));
        let destination = naming::unique_destination(&dest_dir, &file_name);

        // 7. Move.
        move_file(source, &destination)?;
        info!("Filed {} as {}", original_filename, destination.display());

        let mut warnings = Vec::new();

        // 8. Sidecar.
        let final_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let record = DocumentRecord {
            jd_id: Some(jd_id.clone()),
            original_filename: original_filename.clone(),
            filename: final_name,
            file_hash: Some(hash.clone()),
            classification: classification.clone(),
            organized_date: Some(Utc::now()),
            extracted_text: extracted_text.to_string(),
            ..Default::default()
        };
        if let Err(e) = write_sidecar(&destination, SidecarKind::Meta, &record) {
            warnings.push(format!("Failed to write metadata sidecar: {}", e));
        }
        for kind in [SidecarKind::Meta, SidecarKind::Analysis] {
            if let Err(e) = remove_sidecar(source, kind) {
                warnings.push(format!("Failed to remove stale sidecar: {}", e));
            }
        }

        // 9. Search log.
        let entry = SearchEntry::new(
            &destination,
            &original_filename,
            &jd_id,
            classification,
            extracted_text,
        );
        if let Err(e) = self.search.append(entry) {
            warnings.push(format!("Failed to update search index: {}", e));
        }

        // 10. Hash index.
        self.hashes.remove_path(source);
        self.hashes.insert(hash.clone(), &destination);
        if let Err(e) = self.hashes.save() {
            warnings.push(format!("Failed to update hash index: {}", e));
        }

        if self.taxonomy.exists() {
            let document = destination.to_string_lossy();
            self.taxonomy
                .record_classification(area, category, classification.confidence, &document);
            if let Err(e) = self.taxonomy.save() {
                warnings.push(format!("Failed to update taxonomy statistics: {}", e));
            }
        }

        for warning in &warnings {
            warn!("{}: {}", destination.display(), warning);
        }

        Ok(OrganizeOutcome {
            destination,
            jd_id,
            hash,
            warnings,
        })
    }

    /// `<root>/<area>/<category>`, after checking the names are well-formed
    /// single path components and the category number fits the area.
    fn destination_dir(&self, area: &str, category: &str) -> Result<PathBuf> {
        if !is_valid_area_name(area) || !is_single_component(area) {
            return Err(JdexError::InvalidParams {
                message: format!("Invalid area name: '{}'", area),
            });
        }
        if !is_valid_category_name(category) || !is_single_component(category) {
            return Err(JdexError::InvalidParams {
                message: format!("Invalid category name: '{}'", category),
            });
        }
        if !category_belongs_to_area(category, area) {
            return Err(JdexError::InvalidParams {
                message: format!("Category {} outside range for {}", category, area),
            });
        }

        let dir = self.library_root.join(area).join(category);
        if let Some(inbox) = &self.inbox_dir {
            if dir.starts_with(inbox) || inbox.starts_with(&dir) {
                return Err(JdexError::InvalidParams {
                    message: format!("Refusing to file into the inbox: {}", dir.display()),
                });
            }
        }
        Ok(dir)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Move a file, falling back to copy+delete when a rename is not possible
/// (for example across filesystems).
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "Rename {} -> {} failed ({}), copying instead",
                source.display(),
                destination.display(),
                rename_err
            );
            if let Err(e) = std::fs::copy(source, destination) {
                let _ = std::fs::remove_file(destination);
                return Err(JdexError::Io {
                    message: format!(
                        "Failed to move {} -> {}",
                        source.display(),
                        destination.display()
                    ),
                    path: Some(source.to_path_buf()),
                    source: Some(e),
                });
            }
            // The bytes are safe at the destination; a leftover source is
            // recognised as a duplicate on the next scan.
            if let Err(e) = std::fs::remove_file(source) {
                warn!("Copied {} but could not remove it: {}", source.display(), e);
            }
            Ok(())
        }
    }
}
