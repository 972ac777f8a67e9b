//! Download error types.
//!
//! These errors are serializable so they can travel inside operation events.
//! For I/O errors the kind and message are captured as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a network call as seen by the connectivity monitor.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The network is unreachable. Retried once connectivity returns.
    #[error("No connection: {message}")]
    Recoverable { message: String },

    /// The call failed for a reason that waiting will not fix.
    #[error("Connection failed: {message}")]
    Unrecoverable { message: String },

    /// The outer retry bound was reached while still offline.
    #[error("Still offline after {attempts} connectivity checks")]
    RetriesExhausted { attempts: u32 },
}

impl ConnectivityError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Recoverable {
            message: message.into(),
        }
    }

    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self::Unrecoverable {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable { .. })
    }
}

/// Coarse classification of a failed download, used for tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadErrorKind {
    /// 4xx: metadata and backend disagree.
    Application,
    /// 5xx: the server is temporarily unable to serve.
    ServerUnavailable,
    /// Connectivity never came back within the outer bound.
    Connectivity,
    /// Local disk failure.
    Io,
    /// Anything else.
    Unexpected,
}

/// Error type for a single item download.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The server rejected the request (HTTP 4xx).
    #[error("Could not download {file}: HTTP {status}")]
    Application { file: String, status: u16 },

    /// The server is unavailable (HTTP 5xx).
    #[error("Server unavailable while downloading {file}: HTTP {status}")]
    ServerUnavailable { file: String, status: u16 },

    /// The server answered with a status we do not handle.
    #[error("Unexpected response for {file}: HTTP {status}")]
    UnexpectedStatus { file: String, status: u16 },

    /// Connectivity failure that escaped the retry loop.
    #[error("Connection lost while downloading {file}: {source}")]
    Connectivity {
        file: String,
        source: ConnectivityError,
    },

    /// I/O error while writing the file.
    #[error("I/O error ({kind}): {message}")]
    Io { kind: String, message: String },

    /// The body stream failed mid-transfer.
    #[error("Transfer of {file} failed: {message}")]
    Transfer { file: String, message: String },

    /// The bytes landed but the file entry could not be updated.
    #[error("Could not record download of {file}: {message}")]
    Store { file: String, message: String },
}

impl DownloadError {
    /// Classify a non-2xx HTTP status for `file`.
    #[must_use]
    pub fn from_status(file: impl Into<String>, status: u16) -> Self {
        let file = file.into();
        match status {
            400..=499 => Self::Application { file, status },
            500..=599 => Self::ServerUnavailable { file, status },
            _ => Self::UnexpectedStatus { file, status },
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    pub fn transfer(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transfer {
            file: file.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DownloadErrorKind {
        match self {
            Self::Application { .. } => DownloadErrorKind::Application,
            Self::ServerUnavailable { .. } => DownloadErrorKind::ServerUnavailable,
            Self::Connectivity { .. } => DownloadErrorKind::Connectivity,
            Self::Io { .. } => DownloadErrorKind::Io,
            Self::UnexpectedStatus { .. } | Self::Transfer { .. } | Self::Store { .. } => {
                DownloadErrorKind::Unexpected
            }
        }
    }

    /// Whether the caller may sensibly re-queue the whole operation later.
    #[must_use]
    pub const fn is_server_unavailable(&self) -> bool {
        matches!(self, Self::ServerUnavailable { .. })
    }

    /// Whether this failure should be forwarded to error telemetry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Application { .. } | Self::Io { .. } | Self::Store { .. }
        )
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Result type alias for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classes() {
        assert_eq!(
            DownloadError::from_status("a.png", 404).kind(),
            DownloadErrorKind::Application
        );
        assert_eq!(
            DownloadError::from_status("a.png", 503).kind(),
            DownloadErrorKind::ServerUnavailable
        );
        assert_eq!(
            DownloadError::from_status("a.png", 304).kind(),
            DownloadErrorKind::Unexpected
        );
    }

    #[test]
    fn test_application_error_message_names_file_and_status() {
        let err = DownloadError::from_status("issue.pdf", 410);
        let msg = err.to_string();
        assert!(msg.contains("issue.pdf"));
        assert!(msg.contains("410"));
        assert!(err.is_reportable());
        assert!(!err.is_server_unavailable());
    }

    #[test]
    fn test_server_unavailable_is_tagged() {
        let err = DownloadError::from_status("issue.pdf", 502);
        assert!(err.is_server_unavailable());
        assert!(!err.is_reportable());
    }

    #[test]
    fn test_connectivity_recoverable() {
        assert!(ConnectivityError::recoverable("dns").is_recoverable());
        assert!(!ConnectivityError::unrecoverable("tls").is_recoverable());
        assert!(!ConnectivityError::RetriesExhausted { attempts: 3 }.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DownloadError::from(io);
        assert_eq!(err.kind(), DownloadErrorKind::Io);
        assert!(err.to_string().contains("PermissionDenied"));
    }
}
