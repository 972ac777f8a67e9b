//! Composition utilities for building the content store.

use std::path::Path;
use std::sync::Arc;

use folio_core::ContentStore;
use sqlx::SqlitePool;

use crate::repositories::SqliteContentStore;
use crate::setup::setup_database;

/// Factory for `SQLite` backed ports.
///
/// Construction only, no domain logic.
pub struct StoreFactory;

impl StoreFactory {
    /// Open (or create) the database at `db_path` and wrap it as a content store.
    pub async fn open(db_path: &Path) -> anyhow::Result<Arc<dyn ContentStore>> {
        let pool = setup_database(db_path).await?;
        Ok(Self::build_store(pool))
    }

    /// Wrap an initialized pool.
    pub fn build_store(pool: SqlitePool) -> Arc<dyn ContentStore> {
        Arc::new(SqliteContentStore::new(pool))
    }

    /// In-memory store with the full schema, for tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn open_in_memory() -> anyhow::Result<Arc<dyn ContentStore>> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self::build_store(pool))
    }
}
