//! Persistence helpers for the library's JSON documents.
//!
//! Every persisted document (taxonomy, allocator state, hash index, ledger,
//! search index, sidecars) is read fully and rewritten fully through
//! [`atomic_write_json`].

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json, read_json_or_default};
