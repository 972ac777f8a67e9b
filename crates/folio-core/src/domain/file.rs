use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the bytes of a file have been materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    /// Metadata only; nothing on disk.
    #[default]
    NotStored,
    /// Stored below the internal storage root.
    Internal,
    /// Stored below the external (removable) storage root.
    External,
}

impl StorageLocation {
    /// Stable string used for persistence.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStored => "not_stored",
            Self::Internal => "internal",
            Self::External => "external",
        }
    }

    /// Whether bytes may exist on disk for this location.
    pub const fn is_stored(&self) -> bool {
        !matches!(self, Self::NotStored)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_stored" => Ok(Self::NotStored),
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            other => Err(format!("unknown storage location: {other}")),
        }
    }
}

/// Which part of the publication a file belongs to.
///
/// Determines the folder layout below a storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Belongs to a single issue.
    #[default]
    Issue,
    /// Part of the shared resource bundle.
    Resource,
    /// Shared between issues (e.g. author images).
    Global,
    /// Publicly reachable without authentication.
    Public,
}

impl StorageType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Resource => "resource",
            Self::Global => "global",
            Self::Public => "public",
        }
    }
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Self::Issue),
            "resource" => Ok(Self::Resource),
            "global" => Ok(Self::Global),
            "public" => Ok(Self::Public),
            other => Err(format!("unknown storage type: {other}")),
        }
    }
}

/// Metadata of a single downloadable file.
///
/// Files are the leaves of the content graph: every composite entity
/// references one or more of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name; unique key.
    pub name: String,
    pub storage_type: StorageType,
    /// Modification time on the server in milliseconds. Higher wins on save.
    pub mo_time: i64,
    /// Expected SHA-256 digest (lowercase hex), if known.
    pub sha256: Option<String>,
    /// Expected size in bytes, if known.
    pub size: Option<u64>,
    /// Folder relative to the storage root.
    pub folder: String,
    /// When the bytes were last downloaded.
    pub date_download: Option<DateTime<Utc>>,
    pub storage_location: StorageLocation,
}

impl FileEntry {
    /// Create a new, not yet stored file entry.
    pub fn new(name: impl Into<String>, folder: impl Into<String>, mo_time: i64) -> Self {
        Self {
            name: name.into(),
            storage_type: StorageType::default(),
            mo_time,
            sha256: None,
            size: None,
            folder: folder.into(),
            date_download: None,
            storage_location: StorageLocation::NotStored,
        }
    }

    #[must_use]
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn with_storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = storage_type;
        self
    }

    /// Path of the file relative to its storage root.
    pub fn relative_path(&self) -> String {
        if self.folder.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.folder.trim_end_matches('/'), self.name)
        }
    }

    pub const fn is_downloaded(&self) -> bool {
        self.date_download.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_location_roundtrip() {
        for location in [
            StorageLocation::NotStored,
            StorageLocation::Internal,
            StorageLocation::External,
        ] {
            assert_eq!(location.as_str().parse::<StorageLocation>(), Ok(location));
        }
        assert!("floppy".parse::<StorageLocation>().is_err());
    }

    #[test]
    fn test_is_stored() {
        assert!(!StorageLocation::NotStored.is_stored());
        assert!(StorageLocation::Internal.is_stored());
        assert!(StorageLocation::External.is_stored());
    }

    #[test]
    fn test_relative_path() {
        let entry = FileEntry::new("a.html", "taz/2024-01-01", 1);
        assert_eq!(entry.relative_path(), "taz/2024-01-01/a.html");

        let trailing = FileEntry::new("b.png", "global/", 1);
        assert_eq!(trailing.relative_path(), "global/b.png");

        let bare = FileEntry::new("c.css", "", 1);
        assert_eq!(bare.relative_path(), "c.css");
    }
}
