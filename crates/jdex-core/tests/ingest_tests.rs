//! End-to-end tests for the inbox loop against a real library directory.
//!
//! Uses the default extractor chain and keyword classification, so no
//! external tools or network services are needed.

use jdex_core::library::{read_sidecar, SidecarKind};
use jdex_core::IngestLoop;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct TestEnv {
    _temp_dir: TempDir,
    library: PathBuf,
    inbox: PathBuf,
}

/// Library and inbox side by side in a fresh temp dir.
fn create_test_env() -> TestEnv {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let library = temp_dir.path().join("jd_documents");
    let inbox = temp_dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();

    TestEnv {
        _temp_dir: temp_dir,
        library,
        inbox,
    }
}

/// Filed documents (sidecars excluded) in one category folder, sorted.
fn documents_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.ends_with(".meta.json") && !n.ends_with(".analysis.json"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_receipt_is_filed_with_sidecar_and_search_entry() {
    let env = create_test_env();
    fs::write(
        env.inbox.join("amazon_receipt.txt"),
        "Purchase receipt for a new laptop",
    )
    .unwrap();

    let mut ingest = IngestLoop::new(&env.library, &env.inbox).unwrap();
    let report = ingest.run_once().await.unwrap();
    assert_eq!(report.organized, 1);
    assert_eq!(report.failed, 0);

    let category_dir = env.library.join("10-19 Finance").join("14 Receipts");
    let filed = documents_in(&category_dir);
    assert_eq!(filed.len(), 1);
    assert!(filed[0].starts_with("14.01 Amazon Receipt "));
    assert!(filed[0].ends_with(".txt"));
    assert!(!env.inbox.join("amazon_receipt.txt").exists());

    let meta = read_sidecar(&category_dir.join(&filed[0]), SidecarKind::Meta)
        .unwrap()
        .expect("meta sidecar");
    assert_eq!(meta.jd_id.as_deref(), Some("14.01"));
    assert_eq!(meta.classification.jd_area, "10-19 Finance");
    assert_eq!(meta.classification.jd_category, "14 Receipts");
    assert_eq!(meta.original_filename, "amazon_receipt.txt");
    assert!(meta.file_hash.is_some_and(|h| !h.is_empty()));

    let search: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(env.library.join(".search_index.json")).unwrap())
            .unwrap();
    assert_eq!(search.as_array().map(|a| a.len()), Some(1));

    // A second pass finds nothing left to do
    let ledger_path = env.library.join(".processed_files.json");
    let ledger_before = fs::read(&ledger_path).unwrap();
    let again = ingest.run_once().await.unwrap();
    assert!(again.is_empty());
    assert_eq!(documents_in(&category_dir).len(), 1);
    assert!(fs::read_dir(&env.inbox).unwrap().next().is_none());
    assert_eq!(fs::read(&ledger_path).unwrap(), ledger_before);
}

#[tokio::test]
async fn test_duplicate_content_is_removed_across_restarts() {
    let env = create_test_env();
    fs::write(env.inbox.join("statement.txt"), "Monthly bank statement").unwrap();

    let mut ingest = IngestLoop::new(&env.library, &env.inbox).unwrap();
    assert_eq!(ingest.run_once().await.unwrap().organized, 1);
    drop(ingest);

    // Same bytes under another name, seen by a fresh loop
    fs::write(env.inbox.join("statement copy.txt"), "Monthly bank statement").unwrap();
    let mut ingest = IngestLoop::new(&env.library, &env.inbox).unwrap();
    let report = ingest.run_once().await.unwrap();

    assert_eq!(report.organized, 0);
    assert_eq!(report.skipped_duplicates, 1);
    assert!(!env.inbox.join("statement copy.txt").exists());
    let banking = env.library.join("10-19 Finance").join("11 Banking");
    assert_eq!(documents_in(&banking).len(), 1);
}

#[tokio::test]
async fn test_same_name_and_year_never_overwrites() {
    let env = create_test_env();
    let mut ingest = IngestLoop::new(&env.library, &env.inbox).unwrap();

    fs::write(env.inbox.join("amazon_receipt.txt"), "Purchase receipt, first order").unwrap();
    ingest.run_once().await.unwrap();
    fs::write(env.inbox.join("amazon_receipt.txt"), "Purchase receipt, second order").unwrap();
    ingest.run_once().await.unwrap();

    let category_dir = env.library.join("10-19 Finance").join("14 Receipts");
    let filed = documents_in(&category_dir);
    assert_eq!(filed.len(), 2);
    assert!(filed.iter().all(|name| name.starts_with("14.01 Amazon Receipt ")));
    assert!(filed.iter().any(|name| name.ends_with("_1.txt")));
}

#[tokio::test]
async fn test_unextractable_file_is_quarantined_next_to_inbox() {
    let env = create_test_env();
    fs::write(env.inbox.join("empty.txt"), "").unwrap();
    fs::write(env.inbox.join("receipt.txt"), "Purchase receipt").unwrap();

    let mut ingest = IngestLoop::new(&env.library, &env.inbox).unwrap();
    let report = ingest.run_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.organized, 1);
    let failed_dir = env.inbox.parent().unwrap().join("_failed");
    assert_eq!(ingest.failed_dir(), failed_dir.as_path());
    assert!(failed_dir.join("empty.txt").exists());
    assert!(fs::read_dir(&env.inbox).unwrap().next().is_none());
}
