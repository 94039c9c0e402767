//! Builder for configuring JdexApi initialization.

use super::JdexApi;
use crate::classify::CategorizationPipeline;
use crate::extract::ExtractorChain;
use crate::ingest::Analyzer;
use crate::library::Organizer;
use crate::settings::{default_inbox_dir, JdexConfig};
use crate::{JdexError, Result};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Builder for configuring JdexApi initialization.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> jdex_core::Result<()> {
/// use jdex_core::JdexApi;
///
/// let api = JdexApi::builder("./jd_documents")
///     .auto_create_dirs(true)
///     .build()
///     .await?;
/// let files = api.list_files(None, false).await?;
/// # Ok(())
/// # }
/// ```
pub struct JdexApiBuilder {
    library_root: PathBuf,
    inbox_dir: Option<PathBuf>,
    analyzer: Option<Analyzer>,
    auto_create_dirs: bool,
}

impl JdexApiBuilder {
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            inbox_dir: None,
            analyzer: None,
            auto_create_dirs: false,
        }
    }

    /// Library root, inbox and backends from resolved configuration.
    pub fn from_config(config: &JdexConfig) -> Result<Self> {
        Ok(Self::new(&config.library_dir)
            .inbox(&config.inbox_dir)
            .analyzer(Analyzer::from_config(config)?))
    }

    /// Inbox directory. Default: `<library>/00-09 System/01 Inbox`.
    pub fn inbox(mut self, inbox_dir: impl Into<PathBuf>) -> Self {
        self.inbox_dir = Some(inbox_dir.into());
        self
    }

    /// Extraction and classification. Default: built-in extractors with
    /// keyword classification only.
    pub fn analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Create the library root and inbox when missing.
    ///
    /// Default: `false` (the library root must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    pub async fn build(self) -> Result<JdexApi> {
        let inbox_dir = self
            .inbox_dir
            .unwrap_or_else(|| default_inbox_dir(&self.library_root));

        if self.auto_create_dirs {
            for dir in [&self.library_root, &inbox_dir] {
                std::fs::create_dir_all(dir).map_err(|e| JdexError::Io {
                    message: format!("Failed to create directory: {}", dir.display()),
                    path: Some(dir.clone()),
                    source: Some(e),
                })?;
            }
        } else if !self.library_root.is_dir() {
            return Err(JdexError::Config {
                message: format!(
                    "Library root does not exist: {}",
                    self.library_root.display()
                ),
            });
        }

        let organizer = Organizer::open(&self.library_root)?.with_inbox(&inbox_dir);
        let analyzer = self.analyzer.unwrap_or_else(|| {
            Analyzer::new(
                ExtractorChain::default(),
                CategorizationPipeline::keywords_only(),
            )
        });

        Ok(JdexApi {
            library_root: self.library_root,
            inbox_dir,
            analyzer,
            organizer: Mutex::new(organizer),
        })
    }
}
