//! Errors from resolving and preparing folio directories.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("No home directory to expand `~` against")]
    NoHomeDir,

    #[error("No platform data directory; set FOLIO_DATA_DIR")]
    NoDataDir,

    #[error("Relative path {0} needs a working directory, which is unavailable")]
    NoWorkingDir(PathBuf),

    #[error("Expected a directory at {0}")]
    NotADirectory(PathBuf),

    #[error("Could not create {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Empty path")]
    EmptyPath,
}
