//! JSON snapshot files
//!
//! Each artifact lives in a single JSON file that is overwritten, never
//! appended. Writes go through a temp file, fsync, and rename so a crash
//! mid-write leaves the previous snapshot intact. A missing file reads as
//! empty state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Atomic reader/writer for one JSON snapshot file.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. An absent file is empty state, not an error.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let value = serde_json::from_slice(&data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(value))
    }

    /// Overwrite the snapshot atomically: write to tmp, fsync, rename.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), bytes = data.len(), "snapshot written");
        Ok(())
    }
}
