//! `SQLite` content store for folio.
//!
//! Implements [`folio_core::ContentStore`] on top of `sqlx`. Foreign keys
//! are enforced on every connection, so deleting a row that is still
//! referenced surfaces as a constraint violation.

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

pub use factory::StoreFactory;
pub use repositories::SqliteContentStore;
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
