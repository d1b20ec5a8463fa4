use super::{SnapshotStore, StatusSnapshot};
use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Accepted on-disk shapes.
///
/// Older deployments kept the mapping under `status_dict` inside their JSON
/// config file. Such a file is only ever read (see `import_from`); the store
/// refuses to write over it.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Embedded { status_dict: StatusSnapshot },
    Plain(StatusSnapshot),
}

impl StoredSnapshot {
    fn into_snapshot(self) -> StatusSnapshot {
        match self {
            StoredSnapshot::Embedded { status_dict } => status_dict,
            StoredSnapshot::Plain(snapshot) => snapshot,
        }
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}

/// Reads and decodes `path`. `Ok(None)` when the file does not exist.
fn read_stored(path: &Path) -> Result<Option<StoredSnapshot>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).context(format!("Failed to open snapshot file '{}'", path.display()))
        }
    };

    let mut json = String::new();
    if is_compressed(path) {
        GzDecoder::new(file)
            .read_to_string(&mut json)
            .context("Failed to decompress snapshot file")?;
    } else {
        file.read_to_string(&mut json)
            .context("Failed to read snapshot file")?;
    }

    serde_json::from_str::<StoredSnapshot>(&json)
        .map(Some)
        .context("Failed to deserialize snapshot JSON")
}

/// Reads the `status_dict` of a legacy config file (or a plain snapshot) without
/// ever modifying it. A missing or unreadable file yields an empty snapshot.
pub fn import_legacy(path: &Path) -> StatusSnapshot {
    match read_stored(path) {
        Ok(Some(stored)) => {
            let snapshot = stored.into_snapshot();
            info!(
                path = %path.display(),
                entities = snapshot.len(),
                "Imported legacy status mapping"
            );
            snapshot
        }
        Ok(None) => {
            info!(path = %path.display(), "Import file not found, starting with empty state");
            StatusSnapshot::new()
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %format!("{:#}", e),
                "Import file unreadable, starting with empty state"
            );
            StatusSnapshot::new()
        }
    }
}

/// Snapshot stored as a JSON object `{"<entity_id>": <status_code>}`.
///
/// Paths ending in `.gz` are gzip-compressed.
pub struct FileSnapshotStore {
    path: PathBuf,
    import_from: Option<PathBuf>,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            import_from: None,
        }
    }

    /// Seeds the first load from a legacy file while `path` does not exist yet.
    pub fn with_import(mut self, import_from: Option<PathBuf>) -> Self {
        self.import_from = import_from;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn legacy_config_error(&self) -> anyhow::Error {
        anyhow!(
            "'{}' is a legacy config file with an embedded status_dict; \
             point snapshot.import_from at it and use a separate snapshot.path",
            self.path.display()
        )
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<StatusSnapshot> {
        match read_stored(&self.path) {
            Ok(Some(StoredSnapshot::Plain(snapshot))) => {
                info!(
                    path = %self.path.display(),
                    entities = snapshot.len(),
                    "Loaded snapshot"
                );
                Ok(snapshot)
            }
            Ok(Some(StoredSnapshot::Embedded { .. })) => Err(self.legacy_config_error()),
            Ok(None) => match &self.import_from {
                Some(import_from) => Ok(import_legacy(import_from)),
                None => {
                    info!(
                        path = %self.path.display(),
                        "No snapshot file yet, starting with empty state"
                    );
                    Ok(StatusSnapshot::new())
                }
            },
            Err(e) => {
                // The next successful save replaces the unreadable file.
                warn!(
                    path = %self.path.display(),
                    error = %format!("{:#}", e),
                    "Corrupt snapshot, starting with empty state"
                );
                Ok(StatusSnapshot::new())
            }
        }
    }

    /// Writes to a `.tmp` sibling, fsyncs, then renames over the target.
    fn save(&self, snapshot: &StatusSnapshot) -> Result<()> {
        if let Ok(Some(StoredSnapshot::Embedded { .. })) = read_stored(&self.path) {
            return Err(self.legacy_config_error());
        }

        let json = serde_json::to_string_pretty(snapshot)
            .context("Failed to serialize snapshot to JSON")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }

        let tmp_path = self.path.with_extension("tmp");

        {
            let tmp_file =
                File::create(&tmp_path).context("Failed to create temporary snapshot file")?;

            let file = if is_compressed(&self.path) {
                let mut encoder = GzEncoder::new(tmp_file, Compression::default());
                encoder
                    .write_all(json.as_bytes())
                    .context("Failed to write compressed snapshot data")?;
                encoder.finish().context("Failed to finish compression")?
            } else {
                let mut file = tmp_file;
                file.write_all(json.as_bytes())
                    .context("Failed to write snapshot data")?;
                file
            };

            file.sync_all()
                .context("Failed to sync snapshot file to disk")?;
        }

        fs::rename(&tmp_path, &self.path).context("Failed to rename temporary snapshot file")?;

        Ok(())
    }
}
