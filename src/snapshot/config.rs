use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the status snapshot is kept
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    /// JSON file (gzip-compressed when the path ends in `.gz`)
    File,
    /// SQLite database
    Sqlite,
}

/// Configuration for the snapshot store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_backend")]
    pub backend: SnapshotBackend,

    /// Snapshot file or database path (relative paths resolve against the config file)
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Legacy JSON config whose `status_dict` seeds an empty store (read only)
    #[serde(default)]
    pub import_from: Option<PathBuf>,
}

fn default_backend() -> SnapshotBackend {
    SnapshotBackend::File
}

fn default_path() -> PathBuf {
    PathBuf::from("vehicle_status.json")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
            import_from: None,
        }
    }
}
