//! On-disk file bytes.
//!
//! The single place that removes downloaded bytes, shared by the scrubber
//! and any caller evicting a file.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::{FileEntry, StorageLocation};
use crate::paths::StorageRoots;
use crate::ports::{ContentStore, RepositoryError};

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No storage root configured for {0}")]
    NoRoot(StorageLocation),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Resolves and removes the bytes of file entries.
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn ContentStore>,
    roots: StorageRoots,
}

impl StorageService {
    pub fn new(store: Arc<dyn ContentStore>, roots: StorageRoots) -> Self {
        Self { store, roots }
    }

    pub const fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    /// Remove the bytes of `entry` from disk.
    ///
    /// Does nothing for entries that were never stored. A file that is
    /// already gone counts as removed. Returns the number of bytes freed.
    pub async fn remove_bytes(&self, entry: &FileEntry) -> Result<u64, StorageError> {
        if !entry.storage_location.is_stored() {
            return Ok(0);
        }
        let path = self
            .roots
            .path_for(entry)
            .ok_or(StorageError::NoRoot(entry.storage_location))?;
        remove_file(&path).await
    }

    /// Evict a stored file: clear its download date and storage location,
    /// then remove the bytes. The bytes stay if the entry cannot be reset.
    pub async fn evict(&self, entry: &FileEntry) -> Result<u64, StorageError> {
        self.store
            .mark_download(&entry.name, None, StorageLocation::NotStored)
            .await?;
        self.remove_bytes(entry).await
    }

    /// Recursively remove a directory. A missing directory is not an error.
    pub async fn clear_directory(path: &Path) -> Result<(), StorageError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

async fn remove_file(path: &Path) -> Result<u64, StorageError> {
    let size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target: "folio.storage", path = %path.display(), "file already gone");
            return Ok(0);
        }
        Err(source) => {
            return Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(size),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(source) => Err(StorageError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}
