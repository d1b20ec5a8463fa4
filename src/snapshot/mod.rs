use crate::status::StatusCode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod config;
pub mod file;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use config::{SnapshotBackend, SnapshotConfig};
pub use file::FileSnapshotStore;
pub use sqlite::SqliteSnapshotStore;

/// Last-known status code per entity (entity_id -> status_code).
///
/// Entries are only ever inserted or overwritten. An entity missing from a
/// poll keeps its last known code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusSnapshot {
    entries: BTreeMap<String, StatusCode>,
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known status for an entity
    pub fn get(&self, entity_id: &str) -> Option<StatusCode> {
        self.entries.get(entity_id).copied()
    }

    /// Records the latest status, returning the previous one (if any).
    pub fn record(&mut self, entity_id: &str, status_code: StatusCode) -> Option<StatusCode> {
        self.entries.insert(entity_id.to_string(), status_code)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.contains_key(entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StatusCode)> {
        self.entries.iter().map(|(id, code)| (id.as_str(), *code))
    }

    /// Entity count (for logging)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, StatusCode)> for StatusSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, StatusCode)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Durable storage for the status snapshot.
///
/// The snapshot is loaded once at the start of a run and saved wholesale at
/// the end. `save` must never leave previously valid state half-written.
/// A single process owns a store at a time.
pub trait SnapshotStore: Send + Sync {
    /// Loads the last saved snapshot, or an empty one if nothing was saved yet.
    fn load(&self) -> Result<StatusSnapshot>;

    /// Atomically replaces the stored snapshot.
    fn save(&self, snapshot: &StatusSnapshot) -> Result<()>;
}

/// Opens the store selected by `config`.
pub fn open_store(config: &SnapshotConfig) -> Result<Box<dyn SnapshotStore>> {
    match config.backend {
        SnapshotBackend::File => Ok(Box::new(
            FileSnapshotStore::new(&config.path).with_import(config.import_from.clone()),
        )),
        SnapshotBackend::Sqlite => Ok(Box::new(
            SqliteSnapshotStore::open(&config.path)?.with_import(config.import_from.clone()),
        )),
    }
}
