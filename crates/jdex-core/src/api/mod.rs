//! Programmatic facade over one library root.
//!
//! Every operation takes the same async mutex, so the review workflow
//! (list, analyze, move, delete) and maintenance calls never interleave their
//! read-modify-write cycles on the library's JSON documents. Another process
//! writing the same library at the same time is not supported.

mod builder;
mod files;
mod library;

pub use builder::JdexApiBuilder;
pub use files::{DeleteSummary, FileEntry};

use crate::ingest::Analyzer;
use crate::library::Organizer;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JdexApi {
    library_root: PathBuf,
    inbox_dir: PathBuf,
    analyzer: Analyzer,
    organizer: Mutex<Organizer>,
}

impl JdexApi {
    /// Start configuring an API for `library_root`.
    pub fn builder(library_root: impl Into<PathBuf>) -> JdexApiBuilder {
        JdexApiBuilder::new(library_root)
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    pub fn inbox_dir(&self) -> &Path {
        &self.inbox_dir
    }

    /// Resolve a caller-supplied path: relative paths are taken from the
    /// library root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.library_root.join(path)
        }
    }

    /// True for paths inside the library root or the inbox.
    fn is_managed(&self, path: &Path) -> bool {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        [&self.library_root, &self.inbox_dir].iter().any(|root| {
            let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            canonical.starts_with(root)
        })
    }
}
