//! The filed-document library: identifiers, duplicate detection, naming,
//! persisted indexes and the organizer that ties them together.
//!
//! Layout on disk:
//!
//! ```text
//! <library>/
//!   jdex.json                      taxonomy document
//!   .jd_ids.json                   identifier allocation state
//!   .hash_index.json               content hash -> filed path
//!   .processed_files.json          ingest ledger
//!   .search_index.json             append-only search log
//!   10-19 Finance/
//!     14 Receipts/
//!       14.01 Amazon Laptop Receipt 2024.pdf
//!       14.01 Amazon Laptop Receipt 2024.pdf.meta.json
//! ```

mod duplicate_index;
mod hashing;
mod id_allocator;
mod ledger;
pub mod naming;
mod organizer;
mod search_index;
mod sidecar;

pub use duplicate_index::{DuplicateIndex, RebuildSummary};
pub use hashing::{hash_bytes, hash_file, hash_file_async};
pub use id_allocator::{allocation_key, CategoryIds, IdAllocator};
pub use ledger::{LedgerEntry, ProcessedLedger};
pub use organizer::{move_file, OrganizeOutcome, Organizer};
pub use search_index::{SearchEntry, SearchIndex};
pub use sidecar::{
    read_sidecar, remove_sidecar, sidecar_path, write_sidecar, DocumentRecord, SidecarKind,
};
