//! Download engine.
//!
//! Stages operations into the shared [`DownloadQueue`] and drains it with a
//! bounded pool of workers.
//!
//! # Concurrency model
//!
//! - One `Mutex` guards the queue. Offer-or-join, poll-and-remove and the
//!   worker exit decision all happen under it; network and disk I/O never do.
//! - Workers exit when the queue is empty. Enqueueing spawns workers again,
//!   never more than `max_concurrent_downloads` at once.
//! - After an item settles, every interested operation (including ones that
//!   joined mid-fetch) is notified and checks its own completion.

mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use folio_core::{
    BackoffPolicy, ContentStore, DownloadError, OperationSummary, TelemetryPort,
};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::http::HttpBackend;
use crate::operation::DownloadOperation;
use crate::queue::{DownloadQueue, Offer, QueueEntry};

pub use worker::{Fetched, WorkerDeps};

/// Dependencies for building a download engine.
pub struct EngineDeps {
    pub backend: Arc<dyn HttpBackend>,
    pub store: Arc<dyn ContentStore>,
    pub telemetry: Arc<dyn TelemetryPort>,
    /// Endpoint probed while offline.
    pub health_check_url: String,
    pub backoff: BackoffPolicy,
    pub max_concurrent_downloads: usize,
}

type SharedOperation = Arc<DownloadOperation>;

pub struct DownloadEngine {
    queue: Mutex<DownloadQueue<SharedOperation>>,
    deps: WorkerDeps,
    max_workers: usize,
    active_workers: AtomicUsize,
}

impl DownloadEngine {
    pub fn new(deps: EngineDeps) -> Self {
        let connectivity = Arc::new(ConnectivityMonitor::new(
            Arc::clone(&deps.backend),
            deps.health_check_url,
            deps.backoff,
        ));
        Self {
            queue: Mutex::new(DownloadQueue::new()),
            deps: WorkerDeps {
                backend: deps.backend,
                connectivity,
                store: deps.store,
                telemetry: deps.telemetry,
            },
            max_workers: deps.max_concurrent_downloads.max(1),
            active_workers: AtomicUsize::new(0),
        }
    }

    pub const fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.deps.connectivity
    }

    /// Entries waiting to be fetched.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    /// Announce `operation`, queue its items and make sure workers run.
    pub async fn enqueue_download(self: &Arc<Self>, operation: SharedOperation) {
        operation.start();

        let mut queue = self.queue.lock().await;
        for item in operation.items() {
            let key = item.key.clone();
            match queue.offer_or_notify(item.clone(), Arc::clone(&operation)) {
                Offer::Enqueued => trace!(target: "folio.download", file = %key, "queued"),
                Offer::Deduplicated => {
                    debug!(target: "folio.download", file = %key, tag = operation.tag(), "joined queued download");
                }
                Offer::JoinedInFlight => {
                    debug!(target: "folio.download", file = %key, tag = operation.tag(), "joined running download");
                }
            }
        }
        self.ensure_running(&queue);
    }

    /// Enqueue and wait for the summary.
    pub async fn download(self: &Arc<Self>, operation: SharedOperation) -> OperationSummary {
        self.enqueue_download(Arc::clone(&operation)).await;
        operation.wait_for_completion().await
    }

    /// Spawn workers up to the bound, one per waiting entry.
    ///
    /// Called with the queue lock held so a worker cannot decide to exit
    /// between our offer and this check.
    fn ensure_running(self: &Arc<Self>, queue: &DownloadQueue<SharedOperation>) {
        let mut wanted = queue.len();
        while wanted > 0 {
            let active = self.active_workers.load(Ordering::SeqCst);
            if active >= self.max_workers {
                break;
            }
            if self
                .active_workers
                .compare_exchange(active, active + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let engine = Arc::clone(self);
                tokio::spawn(async move { engine.run_worker(active).await });
                wanted -= 1;
            }
        }
    }

    async fn run_worker(self: Arc<Self>, worker: usize) {
        trace!(target: "folio.download", worker, "worker started");
        loop {
            let entry = {
                let mut queue = self.queue.lock().await;
                let entry = queue.poll_with_operations();
                if entry.is_none() {
                    self.active_workers.fetch_sub(1, Ordering::SeqCst);
                }
                entry
            };
            let Some(entry) = entry else {
                break;
            };
            self.process(entry).await;
        }
        trace!(target: "folio.download", worker, "worker idle, exiting");
    }

    async fn process(&self, entry: QueueEntry<SharedOperation>) {
        let QueueEntry {
            item,
            mut operations,
        } = entry;
        debug!(target: "folio.download", file = %item.key, priority = %item.priority, "downloading");

        let result = worker::run_item(&self.deps, &item, &operations).await;
        operations.extend(self.queue.lock().await.finish(&item.key));

        match result {
            Ok(fetched) => {
                info!(target: "folio.download", file = %item.key, bytes = fetched.bytes, "downloaded");
                for operation in &operations {
                    operation.record_success(&item.key);
                }
            }
            Err(error) => {
                self.report_failure(&error);
                for operation in &operations {
                    operation.record_failure(&item.key, error.clone());
                }
            }
        }
    }

    fn report_failure(&self, error: &DownloadError) {
        warn!(target: "folio.download", kind = ?error.kind(), error = %error, "download failed");
        if error.is_reportable() {
            self.deps.telemetry.report_error(error);
        }
    }
}
