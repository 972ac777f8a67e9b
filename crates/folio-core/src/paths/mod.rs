//! Path utilities for folio data directories and storage roots.
//!
//! This module provides the canonical path resolution for all folio components:
//! - Application data root and database location
//! - Internal and external storage roots for downloaded files
//! - The transient share cache
//!
//! OS-specific logic is kept private in `platform`.

mod ensure;
mod error;
mod platform;
mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{data_root, database_path, normalize_user_path};
pub use storage::StorageRoots;
