use super::*;
use std::fs;
use tempfile::TempDir;

fn sample() -> StatusSnapshot {
    vec![
        ("7".to_string(), 2),
        ("9".to_string(), 3),
        ("12".to_string(), 6),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_record_returns_previous() {
    let mut snapshot = StatusSnapshot::new();
    assert_eq!(snapshot.record("7", 2), None);
    assert_eq!(snapshot.record("7", 6), Some(2));
    assert_eq!(snapshot.get("7"), Some(6));
    assert!(snapshot.contains("7"));
    assert!(!snapshot.contains("8"));
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_serializes_as_plain_mapping() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json, serde_json::json!({"7": 2, "9": 3, "12": 6}));
}

#[test]
fn test_file_store_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(temp_dir.path().join("state.json"));

    let snapshot = store.load().unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn test_file_store_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(temp_dir.path().join("state.json"));

    store.save(&sample()).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, sample());
}

#[test]
fn test_file_store_gzip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json.gz");
    let store = FileSnapshotStore::new(&path);

    store.save(&sample()).unwrap();

    // gzip magic bytes
    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    assert_eq!(store.load().unwrap(), sample());
}

#[test]
fn test_file_store_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("state.json");
    let store = FileSnapshotStore::new(&path);

    store.save(&sample()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_atomic_write_leaves_no_tmp_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    let store = FileSnapshotStore::new(&path);

    store.save(&sample()).unwrap();

    assert!(path.exists());
    assert!(
        !temp_dir.path().join("state.tmp").exists(),
        "Temporary file should not exist after successful write"
    );
}

#[test]
fn test_save_replaces_previous_state() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(temp_dir.path().join("state.json"));

    store.save(&sample()).unwrap();

    let mut next = store.load().unwrap();
    next.record("7", 6);
    next.record("20", 1);
    store.save(&next).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.get("7"), Some(6));
    assert_eq!(loaded.get("20"), Some(1));
    assert_eq!(loaded.get("9"), Some(3));
}

#[test]
fn test_corrupt_file_loads_as_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json");
    fs::write(&path, b"{ not json").unwrap();

    let store = FileSnapshotStore::new(&path);
    assert!(store.load().unwrap().is_empty());

    // Next save recovers the file
    store.save(&sample()).unwrap();
    assert_eq!(store.load().unwrap(), sample());
}

#[test]
fn test_invalid_gzip_loads_as_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.json.gz");
    fs::write(&path, b"not a gzip file").unwrap();

    let store = FileSnapshotStore::new(&path);
    assert!(store.load().unwrap().is_empty());
}

const LEGACY_CONFIG: &str = r#"{
    "api_key": "secret",
    "message_users_fremdschluessel": ["1000"],
    "status_dict": {"7": 2, "9": 3}
}"#;

#[test]
fn test_import_leaves_legacy_config_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = temp_dir.path().join("config.json");
    fs::write(&legacy, LEGACY_CONFIG).unwrap();

    let store = FileSnapshotStore::new(temp_dir.path().join("state.json"))
        .with_import(Some(legacy.clone()));

    let mut snapshot = store.load().unwrap();
    assert_eq!(snapshot.get("7"), Some(2));
    assert_eq!(snapshot.get("9"), Some(3));
    assert_eq!(snapshot.len(), 2);

    snapshot.record("7", 6);
    store.save(&snapshot).unwrap();

    let after = fs::read_to_string(&legacy).unwrap();
    assert_eq!(after, LEGACY_CONFIG);
    assert!(after.contains("api_key"));

    // Once the snapshot exists the import file is no longer consulted
    assert_eq!(store.load().unwrap().get("7"), Some(6));
}

#[test]
fn test_refuses_to_overwrite_legacy_config() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = temp_dir.path().join("config.json");
    fs::write(&legacy, LEGACY_CONFIG).unwrap();

    let store = FileSnapshotStore::new(&legacy);
    let err = store.load().unwrap_err();
    assert!(err.to_string().contains("import_from"));

    assert!(store.save(&sample()).is_err());
    assert_eq!(fs::read_to_string(&legacy).unwrap(), LEGACY_CONFIG);
}

#[test]
fn test_missing_import_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(temp_dir.path().join("state.json"))
        .with_import(Some(temp_dir.path().join("missing.json")));

    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_sqlite_imports_until_first_save() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = temp_dir.path().join("config.json");
    fs::write(&legacy, LEGACY_CONFIG).unwrap();

    let store = SqliteSnapshotStore::in_memory()
        .unwrap()
        .with_import(Some(legacy.clone()));
    assert_eq!(store.load().unwrap().get("9"), Some(3));

    let next: StatusSnapshot = vec![("7".to_string(), 6)].into_iter().collect();
    store.save(&next).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.get("7"), Some(6));
    assert_eq!(loaded.get("9"), None);
    assert_eq!(fs::read_to_string(&legacy).unwrap(), LEGACY_CONFIG);
}

#[test]
fn test_sqlite_store_save_and_load() {
    let store = SqliteSnapshotStore::in_memory().unwrap();
    assert!(store.load().unwrap().is_empty());

    store.save(&sample()).unwrap();
    assert_eq!(store.load().unwrap(), sample());

    let mut next = sample();
    next.record("7", 6);
    store.save(&next).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.get("7"), Some(6));
    assert_eq!(loaded.len(), 3);
}

#[test]
fn test_sqlite_store_never_deletes_rows() {
    let store = SqliteSnapshotStore::in_memory().unwrap();
    store.save(&sample()).unwrap();

    let partial: StatusSnapshot = vec![("7".to_string(), 1)].into_iter().collect();
    store.save(&partial).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.get("7"), Some(1));
    assert_eq!(loaded.get("12"), Some(6));
}

#[test]
fn test_open_store_by_backend() {
    let temp_dir = TempDir::new().unwrap();

    let file_store = open_store(&SnapshotConfig {
        backend: SnapshotBackend::File,
        path: temp_dir.path().join("state.json"),
        import_from: None,
    })
    .unwrap();
    file_store.save(&sample()).unwrap();
    assert_eq!(file_store.load().unwrap(), sample());

    let sqlite_store = open_store(&SnapshotConfig {
        backend: SnapshotBackend::Sqlite,
        path: temp_dir.path().join("state.db"),
        import_from: None,
    })
    .unwrap();
    sqlite_store.save(&sample()).unwrap();
    assert_eq!(sqlite_store.load().unwrap(), sample());
}
