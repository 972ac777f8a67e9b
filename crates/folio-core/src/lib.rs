//! Core domain types, ports and services for the folio content cache.
//!
//! This crate has no knowledge of SQL or HTTP. Adapters live in
//! `folio-db` (content store) and `folio-download` (fetching).

pub mod domain;
pub mod download;
pub mod paths;
pub mod ports;
pub mod retry;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    Article, Audio, FileEntry, FrontPage, Image, ImageResolution, Issue, IssueKey, IssueStatus,
    Moment, Page, ResourceInfo, Section, StorageLocation, StorageType,
};
pub use download::{
    ConnectivityError, DownloadError, DownloadErrorKind, DownloadItem, DownloadPriority,
    DownloadResult, OperationEvent, OperationSummary,
};
pub use paths::{PathError, StorageRoots, data_root, database_path, ensure_directory};
#[cfg(any(test, feature = "test-utils"))]
pub use ports::RecordingTelemetry;
pub use ports::{ContentStore, NoopTelemetry, RepositoryError, TelemetryPort, TracingTelemetry};
pub use retry::BackoffPolicy;
pub use services::{
    IntegrityCheck, PhaseStats, Schedule, ScheduleStats, ScheduledTask, ScrubError, ScrubReport,
    ScrubTask, Scrubber, ScrubberConfig, StorageError, StorageService, StreamingDigest,
    run_scheduled,
};
pub use settings::{Settings, SettingsError, validate_settings};

