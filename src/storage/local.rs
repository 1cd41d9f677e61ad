//! JSON-file-backed paper store.
//!
//! Persists the full collection as a single JSON document. Saves are
//! atomic: the serialized collection is written to a sibling temporary
//! file, flushed, then renamed over the destination, so a crash mid-save
//! leaves either the old or the new complete file on disk. The rename is
//! the only operation that makes new state visible.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Paper;

/// The in-memory paper collection, keyed by stable id.
pub type PaperDb = HashMap<String, Paper>;

/// File-backed store for the paper collection.
#[derive(Debug, Clone)]
pub struct PaperStore {
    path: PathBuf,
}

impl PaperStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection, starting empty if the file is missing or
    /// unreadable. Load failure is a recoverable condition, not an error.
    pub async fn load(&self) -> PaperDb {
        match self.read_bytes().await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(db) => db,
                Err(e) => {
                    log::warn!(
                        "Failed to parse database {:?}: {}. Starting empty.",
                        self.path,
                        e
                    );
                    PaperDb::new()
                }
            },
            Ok(None) => {
                log::info!("No database at {:?}, starting empty", self.path);
                PaperDb::new()
            }
            Err(e) => {
                log::warn!(
                    "Failed to read database {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                PaperDb::new()
            }
        }
    }

    /// Persist the collection atomically (write to temp, then rename).
    pub async fn save(&self, db: &PaperDb) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(db)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the backing file, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
