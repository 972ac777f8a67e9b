//! Download domain types, events and errors.
//!
//! Pure data shared between the download engine and its callers. No I/O or
//! networking lives here.
//!
//! # Structure
//!
//! - `types` - `DownloadPriority` and the `DownloadItem` work unit
//! - `errors` - `DownloadError` and `ConnectivityError`
//! - `events` - Per-operation events and the completion summary

pub mod errors;
pub mod events;
pub mod types;

pub use errors::{ConnectivityError, DownloadError, DownloadErrorKind, DownloadResult};
pub use events::{OperationEvent, OperationSummary};
pub use types::{DownloadItem, DownloadPriority};
