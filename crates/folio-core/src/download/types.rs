//! Download work units.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FileEntry, StorageLocation};

/// Scheduling priority of a download. `High` drains before `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadPriority {
    #[default]
    Normal,
    High,
}

impl DownloadPriority {
    const fn rank(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::High => 1,
        }
    }
}

impl PartialOrd for DownloadPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DownloadPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for DownloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::High => f.write_str("high"),
        }
    }
}

/// One fetchable file.
///
/// The key is the file name. Two items with the same key describe the same
/// physical download, whoever requested them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Stable key (the file name).
    pub key: String,
    pub priority: DownloadPriority,
    /// URL the bytes are fetched from.
    pub origin: String,
    /// Absolute path the bytes are written to.
    pub destination: PathBuf,
    /// Storage root the destination lives under.
    pub storage_location: StorageLocation,
    /// Expected SHA-256 digest, lowercase hex.
    pub expected_sha256: Option<String>,
    /// Expected size in bytes.
    pub expected_size: Option<u64>,
}

impl DownloadItem {
    pub fn new(
        key: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key: key.into(),
            priority: DownloadPriority::Normal,
            origin: origin.into(),
            destination: destination.into(),
            storage_location: StorageLocation::Internal,
            expected_sha256: None,
            expected_size: None,
        }
    }

    /// Plan the download of a file entry.
    ///
    /// The origin is `base_url/<folder>/<name>` and the destination is the
    /// same relative path below `storage_root`.
    pub fn for_file(
        entry: &FileEntry,
        base_url: &str,
        storage_root: &Path,
        storage_location: StorageLocation,
        priority: DownloadPriority,
    ) -> Self {
        let relative = entry.relative_path();
        Self {
            key: entry.name.clone(),
            priority,
            origin: format!("{}/{}", base_url.trim_end_matches('/'), relative),
            destination: storage_root.join(relative),
            storage_location,
            expected_sha256: entry.sha256.clone(),
            expected_size: entry.size,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: DownloadPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }
}
