//! Events emitted by a download operation.

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;

/// Final tally of a download operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    /// Caller supplied tag identifying the operation.
    pub tag: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl OperationSummary {
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Event delivered to subscribers of a download operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationEvent {
    /// The operation was handed to the engine.
    Started { tag: String, total: usize },
    /// One item reached the success state.
    ItemSucceeded { key: String },
    /// One item reached the failure state.
    ItemFailed { key: String, error: DownloadError },
    /// A fetch is waiting for the network to come back.
    WaitingForConnection,
    /// Every item reached a terminal state. Emitted exactly once.
    Completed(OperationSummary),
}

impl OperationEvent {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
