//! jdex Core - Headless engine for filing documents into a Johnny.Decimal
//! library.
//!
//! Documents dropped into an inbox are extracted, classified against the
//! library's taxonomy, given a stable `NN.xx` identifier and moved to
//! `<library>/<Area>/<Category>/`, with a JSON sidecar, a search-log entry
//! and content-hash deduplication. The `jdex` binary in `jdex-cli` is a thin
//! driver over this crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use jdex_core::ingest::IngestLoop;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> jdex_core::Result<()> {
//!     let mut ingest = IngestLoop::new("/path/to/jd_documents", "/path/to/inbox")?;
//!
//!     let report = ingest.run_once().await?;
//!     println!("Filed {} documents", report.organized);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod library;
pub mod metadata;
pub mod settings;
pub mod taxonomy;

// Re-export commonly used types
pub use api::{JdexApi, JdexApiBuilder};
pub use cancel::CancellationToken;
pub use classify::{BackendKind, CategorizationPipeline, ClassificationResult, Confidence};
pub use error::{JdexError, Result};
pub use ingest::{IngestLoop, IngestReport};
pub use library::{DuplicateIndex, IdAllocator, OrganizeOutcome, Organizer};
pub use settings::{ConfigOverrides, JdexConfig, Settings};
pub use taxonomy::{Taxonomy, TaxonomyStore};
