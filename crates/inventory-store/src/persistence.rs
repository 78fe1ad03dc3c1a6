//! Persistence port for the inventory collection.
//!
//! The repository only ever reads the whole collection once and writes the
//! whole collection back after each mutation, so the port is two calls wide.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::InventoryRecord;

/// Load/save abstraction behind [`crate::InventoryRepository`].
pub trait Persistence: Send + Sync {
    /// Read the persisted collection. A missing file is an empty collection.
    fn load(&self) -> Result<Vec<InventoryRecord>>;

    /// Replace the persisted collection with `records`.
    fn save(&self, records: &[InventoryRecord]) -> Result<()>;
}

/// The collection stored as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("inventory.json");
        self.path
            .with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
    }
}

impl Persistence for JsonFile {
    fn load(&self) -> Result<Vec<InventoryRecord>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "inventory file absent, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<InventoryRecord> = serde_json::from_slice(&raw)?;
        debug!(path = %self.path.display(), count = records.len(), "loaded inventory file");
        Ok(records)
    }

    // Write to a sibling temp file and rename over the target so a crash
    // mid-write never leaves a truncated inventory file behind.
    fn save(&self, records: &[InventoryRecord]) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(records)?;
        let tmp = self.temp_path();

        let written = (|| -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
            std::fs::rename(&tmp, &self.path)
        })();

        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), count = records.len(), "saved inventory file");
        Ok(())
    }
}
