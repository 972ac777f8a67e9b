//! Download worker pipeline.
//!
//! Fetches one item: GET through the connectivity monitor, classify the
//! status, stream the body to `<destination>.part` while hashing it, rename
//! into place, then record the download on the file entry.
//!
//! The worker never touches the queue; the engine owns dedup bookkeeping and
//! notifies operations with whatever this returns.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use folio_core::{
    ContentStore, DownloadError, DownloadItem, IntegrityCheck, RepositoryError, StreamingDigest,
    TelemetryPort,
};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::http::{BodyStream, HttpBackend};
use crate::operation::DownloadOperation;

/// Dependencies for the download worker, cloned out of the engine.
#[derive(Clone)]
pub struct WorkerDeps {
    pub backend: Arc<dyn HttpBackend>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub store: Arc<dyn ContentStore>,
    pub telemetry: Arc<dyn TelemetryPort>,
}

/// What a finished transfer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: u64,
    pub sha256: String,
}

/// Run one item to a terminal outcome.
///
/// `operations` are told when the fetch starts waiting for connectivity.
pub async fn run_item(
    deps: &WorkerDeps,
    item: &DownloadItem,
    operations: &[Arc<DownloadOperation>],
) -> Result<Fetched, DownloadError> {
    let backend = Arc::clone(&deps.backend);
    let response = deps
        .connectivity
        .retry_on_connectivity_failure(
            || {
                for operation in operations {
                    operation.waiting_for_connection();
                }
            },
            || {
                let backend = Arc::clone(&backend);
                let origin = item.origin.clone();
                async move { backend.get(&origin).await }
            },
        )
        .await
        .map_err(|source| DownloadError::Connectivity {
            file: item.key.clone(),
            source,
        })?;

    if !response.is_success() {
        return Err(DownloadError::from_status(&item.key, response.status));
    }

    let fetched = write_body(item, response.body).await?;
    verify(deps, item, &fetched);
    record_download(deps, item).await?;
    Ok(fetched)
}

/// Stream `body` into the temp file next to the destination, then rename.
async fn write_body(item: &DownloadItem, body: BodyStream) -> Result<Fetched, DownloadError> {
    if let Some(parent) = item.destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part = part_path(&item.destination);

    match stream_to(&part, &item.key, body).await {
        Ok(fetched) => {
            tokio::fs::rename(&part, &item.destination).await?;
            Ok(fetched)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                debug!(target: "folio.download", path = %part.display(), error = %cleanup, "no partial file to remove");
            }
            Err(e)
        }
    }
}

async fn stream_to(path: &Path, key: &str, mut body: BodyStream) -> Result<Fetched, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut digest = StreamingDigest::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| DownloadError::transfer(key, e.to_string()))?;
        file.write_all(&chunk).await?;
        digest.update(&chunk);
    }
    file.flush().await?;
    file.sync_all().await?;

    Ok(Fetched {
        bytes: digest.bytes(),
        sha256: digest.finish(),
    })
}

fn part_path(destination: &Path) -> PathBuf {
    let mut part = OsString::from(destination.as_os_str());
    part.push(".part");
    PathBuf::from(part)
}

/// Compare against the expected digest and size. Mismatches are logged and
/// reported; the download still counts as successful.
fn verify(deps: &WorkerDeps, item: &DownloadItem, fetched: &Fetched) {
    if let IntegrityCheck::Mismatch { expected, actual } =
        IntegrityCheck::compare(item.expected_sha256.as_deref(), &fetched.sha256)
    {
        warn!(target: "folio.download", file = %item.key, %expected, %actual, "sha256 mismatch");
        deps.telemetry.report_message(&format!(
            "sha256 mismatch for {}: expected {expected}, got {actual}",
            item.key
        ));
    }

    if let Some(expected) = item.expected_size {
        if expected != fetched.bytes {
            warn!(target: "folio.download", file = %item.key, expected, actual = fetched.bytes, "size mismatch");
        }
    }
}

/// Stamp the file entry. Items without a file entry are plain downloads.
async fn record_download(deps: &WorkerDeps, item: &DownloadItem) -> Result<(), DownloadError> {
    let result = deps
        .store
        .mark_download(&item.key, Some(Utc::now()), item.storage_location)
        .await;

    match result {
        Ok(()) => Ok(()),
        Err(RepositoryError::NotFound(_)) => {
            debug!(target: "folio.download", file = %item.key, "no file entry to update");
            Ok(())
        }
        Err(e) => Err(DownloadError::Store {
            file: item.key.clone(),
            message: e.to_string(),
        }),
    }
}
