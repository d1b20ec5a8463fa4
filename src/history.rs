//! Append-only transition history.
//!
//! One line per transition: `YYYY-MM-DD HH:MM:SS - <name> - <code>`, with the
//! timestamp taken from the entity's reported since-time.

use crate::classifier::TransitionEvent;
use crate::composer::DisplayZone;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct TransitionLog {
    path: PathBuf,
    zone: DisplayZone,
}

impl TransitionLog {
    pub fn new(path: impl Into<PathBuf>, zone: DisplayZone) -> Self {
        Self {
            path: path.into(),
            zone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(&self, event: &TransitionEvent) -> String {
        format!(
            "{} - {} - {}\n",
            self.zone.format(event.status_since),
            event.display_name,
            event.new_status
        )
    }

    pub fn append(&self, event: &TransitionEvent) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create history directory")?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file '{}'", self.path.display()))?;

        file.write_all(self.format_line(event).as_bytes())
            .context("Failed to append to history file")?;
        Ok(())
    }
}
