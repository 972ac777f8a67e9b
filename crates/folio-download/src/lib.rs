//! Priority download engine for folio.
//!
//! - [`DownloadQueue`]: two-lane priority queue that dedups by file name and
//!   lets late requesters join a running fetch.
//! - [`ConnectivityMonitor`]: health probing with exponential backoff, shared
//!   by every waiting worker.
//! - [`DownloadEngine`]: bounded worker pool that drains the queue, streams
//!   bodies to disk through a SHA-256 digest and notifies operations.
//!
//! HTTP goes through the [`HttpBackend`] trait; [`ReqwestBackend`] is the
//! production implementation.

pub mod connectivity;
pub mod engine;
pub mod http;
pub mod operation;
pub mod queue;

pub use connectivity::{ConnectivityMonitor, Reachability};
pub use engine::{DownloadEngine, EngineDeps, Fetched, WorkerDeps};
#[cfg(any(test, feature = "test-utils"))]
pub use http::testing;
pub use http::{BodyStream, HttpBackend, HttpResponse, ReqwestBackend};
pub use operation::{DownloadOperation, OperationState};
pub use queue::{DownloadQueue, Offer, QueueEntry};
