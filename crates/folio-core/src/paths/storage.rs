//! Storage roots for downloaded file bytes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FileEntry, StorageLocation};

/// The directories file bytes are materialized under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRoots {
    pub internal: PathBuf,
    pub external: Option<PathBuf>,
}

impl StorageRoots {
    pub fn new(internal: impl Into<PathBuf>) -> Self {
        Self {
            internal: internal.into(),
            external: None,
        }
    }

    #[must_use]
    pub fn with_external(mut self, external: impl Into<PathBuf>) -> Self {
        self.external = Some(external.into());
        self
    }

    /// Root directory for a storage location.
    ///
    /// `NotStored` has no root; `External` has none when no external storage is configured.
    pub fn dir_for(&self, location: StorageLocation) -> Option<&Path> {
        match location {
            StorageLocation::NotStored => None,
            StorageLocation::Internal => Some(&self.internal),
            StorageLocation::External => self.external.as_deref(),
        }
    }

    /// Absolute on-disk path of a file entry's bytes, if it is stored.
    pub fn path_for(&self, entry: &FileEntry) -> Option<PathBuf> {
        self.dir_for(entry.storage_location)
            .map(|root| root.join(entry.relative_path()))
    }

    /// Location to use for new downloads: external when configured, else internal.
    pub const fn preferred_location(&self) -> StorageLocation {
        if self.external.is_some() {
            StorageLocation::External
        } else {
            StorageLocation::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_for_each_location() {
        let roots = StorageRoots::new("/int").with_external("/ext");
        assert_eq!(roots.dir_for(StorageLocation::NotStored), None);
        assert_eq!(
            roots.dir_for(StorageLocation::Internal),
            Some(Path::new("/int"))
        );
        assert_eq!(
            roots.dir_for(StorageLocation::External),
            Some(Path::new("/ext"))
        );
    }

    #[test]
    fn test_external_missing() {
        let roots = StorageRoots::new("/int");
        assert_eq!(roots.dir_for(StorageLocation::External), None);
        assert_eq!(roots.preferred_location(), StorageLocation::Internal);
    }

    #[test]
    fn test_path_for_entry() {
        let roots = StorageRoots::new("/int");
        let mut entry = FileEntry::new("a.png", "global", 1);
        assert_eq!(roots.path_for(&entry), None);

        entry.storage_location = StorageLocation::Internal;
        assert_eq!(
            roots.path_for(&entry),
            Some(PathBuf::from("/int/global/a.png"))
        );
    }
}
