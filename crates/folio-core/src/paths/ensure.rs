//! Directory creation.

use std::path::Path;

use super::error::PathError;

/// Create `path` and any missing parents. An existing directory is fine;
/// an existing file is not.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PathError::NotADirectory(path.to_path_buf())),
        Err(_) => std::fs::create_dir_all(path).map_err(|source| PathError::CreateFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
