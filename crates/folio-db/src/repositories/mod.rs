//! Repository implementations using `SQLite`.
//!
//! All SQL lives in this module. The `SqlitePool` is confined here and never
//! exposed through the port trait signatures.

mod articles;
mod files;
mod issues;
mod media;
mod row_mappers;
mod sqlite_content_store;

pub use sqlite_content_store::SqliteContentStore;
