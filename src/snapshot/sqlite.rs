//! SQLite-backed snapshot store.
//!
//! # Schema
//! ```sql
//! CREATE TABLE entity_status (
//!     entity_id TEXT PRIMARY KEY,
//!     status_code INTEGER NOT NULL,
//!     updated_at TEXT NOT NULL        -- ISO 8601, when status_code last changed
//! );
//! ```
//!
//! `save` upserts every entry inside one transaction, so a crash mid-save
//! leaves the previous state intact. Rows are never deleted.

use super::file::import_legacy;
use super::{SnapshotStore, StatusSnapshot};
use crate::status::StatusCode;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    import_from: Option<PathBuf>,
}

impl SqliteSnapshotStore {
    /// Opens or creates the database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path
            .as_ref()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open snapshot database")?;
        Self::with_connection(conn)
    }

    /// In-memory store (tests)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entity_status (
                entity_id TEXT PRIMARY KEY,
                status_code INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create entity_status table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            import_from: None,
        })
    }

    /// Seeds loads from a legacy file while the table is still empty.
    pub fn with_import(mut self, import_from: Option<PathBuf>) -> Self {
        self.import_from = import_from;
        self
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<StatusSnapshot> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Snapshot database lock poisoned"))?;

        let mut stmt = conn
            .prepare("SELECT entity_id, status_code FROM entity_status")
            .context("Failed to prepare snapshot query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, StatusCode>(1)?))
            })
            .context("Failed to query snapshot")?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.context("Failed to read snapshot row")?);
        }

        match &self.import_from {
            Some(import_from) if entries.is_empty() => Ok(import_legacy(import_from)),
            _ => Ok(entries.into_iter().collect()),
        }
    }

    fn save(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Snapshot database lock poisoned"))?;

        let now = Utc::now().to_rfc3339();
        let tx = conn
            .transaction()
            .context("Failed to begin snapshot transaction")?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO entity_status (entity_id, status_code, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(entity_id) DO UPDATE SET
                        status_code = excluded.status_code,
                        updated_at = excluded.updated_at
                    WHERE entity_status.status_code != excluded.status_code
                    "#,
                )
                .context("Failed to prepare snapshot upsert")?;

            for (entity_id, status_code) in snapshot.iter() {
                stmt.execute(params![entity_id, status_code, now])
                    .with_context(|| format!("Failed to store status for entity {}", entity_id))?;
            }
        }

        tx.commit().context("Failed to commit snapshot")?;
        Ok(())
    }
}
