//! CLI error type and exit codes.

use folio_core::{PathError, RepositoryError, ScrubError, SettingsError, StorageError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or inconsistent arguments.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Settings or path resolution failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content store error.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(String),

    /// A scrub pass aborted.
    #[error("Scrub failed: {0}")]
    Scrub(String),

    /// Some downloads of a fetch failed.
    #[error("{failed} of {total} downloads failed")]
    Downloads { failed: usize, total: usize },
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,  // EX_USAGE
            Self::Downloads { .. } => 3,
            Self::Scrub(_) => 1,
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Database(_) => 73, // EX_CANTCREAT
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RepositoryError> for CliError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<ScrubError> for CliError {
    fn from(err: ScrubError) -> Self {
        Self::Scrub(err.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Repository(repo) => repo.into(),
            StorageError::NoRoot(_) => Self::Config(err.to_string()),
            StorageError::Delete { .. } => Self::Io(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use folio_core::StorageLocation;

    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Downloads { failed: 1, total: 2 }.exit_code(), 3);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
    }

    #[test]
    fn test_storage_errors_map_by_cause() {
        let no_root: CliError = StorageError::NoRoot(StorageLocation::External).into();
        assert!(matches!(no_root, CliError::Config(_)));

        let delete: CliError = StorageError::Delete {
            path: PathBuf::from("/x"),
            source: std::io::Error::other("busy"),
        }
        .into();
        assert!(matches!(delete, CliError::Io(_)));
    }

    #[test]
    fn test_download_message() {
        let err = CliError::Downloads { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 of 5 downloads failed");
    }
}
