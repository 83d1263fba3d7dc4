// Storage backend tests: atomic writes and backup fallback

use super::*;
use super::testing::CrashingFs;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Doc {
    name: String,
    count: u32,
}

fn doc(name: &str, count: u32) -> Doc {
    Doc { name: name.to_string(), count }
}

#[test]
fn test_save_then_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    let store = JsonStore::default();

    store.save_atomic(&path, &doc("first", 1)).unwrap();

    let loaded: Doc = store.load_with_fallback(&path, Doc::default());
    assert_eq!(loaded, doc("first", 1));
    assert!(!with_suffix(&path, TEMP_SUFFIX).exists(), "No temp file should remain");
}

#[test]
fn test_second_save_keeps_previous_as_backup() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    let store = JsonStore::default();

    store.save_atomic(&path, &doc("v1", 1)).unwrap();
    store.save_atomic(&path, &doc("v2", 2)).unwrap();

    let backup: Doc = serde_json::from_slice(&std::fs::read(with_suffix(&path, BACKUP_SUFFIX)).unwrap()).unwrap();
    assert_eq!(backup, doc("v1", 1));
}

#[test]
fn test_crash_before_rename_leaves_original_intact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    let fs = Arc::new(CrashingFs::default());
    let store = JsonStore::new(fs.clone());

    store.save_atomic(&path, &doc("stable", 7)).unwrap();

    fs.crash_before_rename(true);
    let result = store.save_atomic(&path, &doc("lost", 8));
    assert!(matches!(result, Err(VideothequeError::Write(_))));
    assert!(!with_suffix(&path, TEMP_SUFFIX).exists(), "Temp file must be cleaned up");

    // Next load observes the original content unchanged
    fs.crash_before_rename(false);
    let reopened = JsonStore::default();
    let loaded: Doc = reopened.load_with_fallback(&path, Doc::default());
    assert_eq!(loaded, doc("stable", 7));
}

#[test]
fn test_corrupt_primary_falls_back_to_backup() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    let store = JsonStore::default();

    store.save_atomic(&path, &doc("v1", 1)).unwrap();
    store.save_atomic(&path, &doc("v2", 2)).unwrap();

    // Truncated write from some external tool
    std::fs::write(&path, b"{\"name\": \"v3\", \"cou").unwrap();

    let loaded: Doc = store.load_with_fallback(&path, Doc::default());
    assert_eq!(loaded, doc("v1", 1));
}

#[test]
fn test_missing_primary_uses_backup() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    std::fs::write(
        with_suffix(&path, BACKUP_SUFFIX),
        serde_json::to_vec(&doc("from-backup", 3)).unwrap(),
    )
    .unwrap();

    let loaded: Doc = JsonStore::default().load_with_fallback(&path, Doc::default());
    assert_eq!(loaded, doc("from-backup", 3));
}

#[test]
fn test_both_unusable_returns_default() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    std::fs::write(&path, b"not json").unwrap();
    std::fs::write(with_suffix(&path, BACKUP_SUFFIX), b"[also not json").unwrap();

    let loaded: Doc = JsonStore::default().load_with_fallback(&path, doc("default", 0));
    assert_eq!(loaded, doc("default", 0));
}

#[test]
fn test_nothing_on_disk_returns_default() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("missing.json");

    let loaded: Vec<Doc> = JsonStore::default().load_with_fallback(&path, Vec::new());
    assert!(loaded.is_empty());
}
