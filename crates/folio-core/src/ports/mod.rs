//! Ports: what the core needs from storage and error reporting.
//!
//! - [`ContentStore`] is CRUD plus one orphan query per entity type.
//!   Signatures carry domain types only.
//! - [`TelemetryPort`] never blocks and never fails.

pub mod content_store;
pub mod telemetry;

use thiserror::Error;

pub use content_store::ContentStore;
#[cfg(test)]
pub use content_store::MockContentStore;
#[cfg(any(test, feature = "test-utils"))]
pub use telemetry::RecordingTelemetry;
pub use telemetry::{NoopTelemetry, TelemetryPort, TracingTelemetry};

/// Content store failure, independent of the backing database.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row with that key.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The row is still referenced and a foreign key protects it.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl RepositoryError {
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}
