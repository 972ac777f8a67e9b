//! Core services.
//!
//! Services orchestrate ports; they own no infrastructure themselves.

pub mod integrity;
pub mod schedule;
pub mod scrubber;
pub mod storage;

pub use integrity::{IntegrityCheck, StreamingDigest};
pub use schedule::{Schedule, ScheduleStats, ScheduledTask, run_scheduled};
pub use scrubber::{PhaseStats, ScrubError, ScrubReport, ScrubTask, Scrubber, ScrubberConfig};
pub use storage::{StorageError, StorageService};
