//! Platform-specific path detection and resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Get the root directory for application data (database, downloads).
///
/// Resolution order:
/// 1. `FOLIO_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/folio`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("FOLIO_DATA_DIR") {
        return normalize_user_path(&path);
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("folio"))
}

/// Get the path to the folio database file, creating its directory.
pub fn database_path() -> Result<PathBuf, PathError> {
    let root = data_root()?;
    fs::create_dir_all(&root).map_err(|source| PathError::CreateFailed {
        path: root.clone(),
        source,
    })?;
    Ok(root.join("folio.db"))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        let cwd = env::current_dir().map_err(|_| PathError::NoWorkingDir(expanded.clone()))?;
        Ok(cwd.join(expanded))
    }
}
