//! Core domain types.
//!
//! These types represent the persisted publication model, independent of
//! any infrastructure concerns (database, filesystem, HTTP).
//!
//! # Structure
//!
//! - `file` - Leaf file metadata (`FileEntry`, `StorageLocation`)
//! - `content` - Composite entities referencing files (`Image`, `Audio`, `Page`, `Article`, `Section`)
//! - `issue` - Roots of the reference graph (`Issue`, `Moment`, `FrontPage`, `ResourceInfo`)
//!
//! Composite entities reference their children by key (file name or issue
//! key), mirroring the relational layout the content store persists.

mod content;
mod file;
mod issue;

pub use content::{Article, Audio, Image, ImageResolution, Page, Section};
pub use file::{FileEntry, StorageLocation, StorageType};
pub use issue::{FrontPage, Issue, IssueKey, IssueStatus, Moment, ResourceInfo};
