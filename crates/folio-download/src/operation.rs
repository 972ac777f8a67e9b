//! Download operations: one caller's request for a set of files.
//!
//! An operation fans its progress out as [`OperationEvent`]s to any number of
//! subscribers and mirrors its counters in a `watch` channel. Outcomes are
//! recorded per key; the first outcome for a key wins, so an operation that
//! joined the same fetch twice is still counted once. `Completed` is emitted
//! exactly once, right after the last outstanding key settles.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use folio_core::{DownloadError, DownloadItem, OperationEvent, OperationSummary};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Progress counters of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationState {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub completed: bool,
}

impl OperationState {
    pub const fn outstanding(&self) -> usize {
        self.total - self.succeeded - self.failed
    }
}

struct Inner {
    settled: HashSet<String>,
    subscribers: Vec<mpsc::UnboundedSender<OperationEvent>>,
    summary: Option<OperationSummary>,
}

/// A bundle of files requested together.
pub struct DownloadOperation {
    tag: String,
    items: Vec<DownloadItem>,
    keys: HashSet<String>,
    inner: Mutex<Inner>,
    state: watch::Sender<OperationState>,
}

impl DownloadOperation {
    pub fn new(tag: impl Into<String>, items: Vec<DownloadItem>) -> Self {
        let keys: HashSet<String> = items.iter().map(|item| item.key.clone()).collect();
        let (state, _) = watch::channel(OperationState {
            total: keys.len(),
            ..OperationState::default()
        });
        Self {
            tag: tag.into(),
            items,
            keys,
            inner: Mutex::new(Inner {
                settled: HashSet::new(),
                subscribers: Vec::new(),
                summary: None,
            }),
            state,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn items(&self) -> &[DownloadItem] {
        &self.items
    }

    /// Current counters.
    pub fn state(&self) -> OperationState {
        *self.state.borrow()
    }

    /// Watch the counters.
    pub fn watch(&self) -> watch::Receiver<OperationState> {
        self.state.subscribe()
    }

    /// Receive every event from now on.
    ///
    /// A subscriber attaching after completion receives the `Completed`
    /// event right away.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<OperationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if let Some(ref summary) = inner.summary {
            let _ = tx.send(OperationEvent::Completed(summary.clone()));
        } else {
            inner.subscribers.push(tx);
        }
        rx
    }

    /// Wait until every item settled.
    pub async fn wait_for_completion(&self) -> OperationSummary {
        let mut rx = self.state.subscribe();
        // the sender lives in `self`, so the channel cannot close under us
        let state = match rx.wait_for(|s| s.completed).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        self.summary_from(state)
    }

    /// Announce the operation. An operation without items completes here.
    pub(crate) fn start(&self) {
        let mut inner = self.lock();
        Self::emit(
            &mut inner,
            &OperationEvent::Started {
                tag: self.tag.clone(),
                total: self.keys.len(),
            },
        );
        self.complete_if_settled(&mut inner);
    }

    /// A fetch of one of our items is waiting for connectivity.
    pub(crate) fn waiting_for_connection(&self) {
        let mut inner = self.lock();
        if inner.summary.is_none() {
            Self::emit(&mut inner, &OperationEvent::WaitingForConnection);
        }
    }

    pub(crate) fn record_success(&self, key: &str) {
        self.record(key, None);
    }

    pub(crate) fn record_failure(&self, key: &str, error: DownloadError) {
        self.record(key, Some(error));
    }

    fn record(&self, key: &str, error: Option<DownloadError>) {
        if !self.keys.contains(key) {
            return;
        }
        let mut inner = self.lock();
        if !inner.settled.insert(key.to_string()) {
            debug!(target: "folio.download", tag = %self.tag, key, "outcome already recorded");
            return;
        }

        let event = match error {
            None => {
                self.state.send_modify(|s| s.succeeded += 1);
                OperationEvent::ItemSucceeded {
                    key: key.to_string(),
                }
            }
            Some(error) => {
                self.state.send_modify(|s| s.failed += 1);
                OperationEvent::ItemFailed {
                    key: key.to_string(),
                    error,
                }
            }
        };
        Self::emit(&mut inner, &event);
        self.complete_if_settled(&mut inner);
    }

    fn complete_if_settled(&self, inner: &mut Inner) {
        if inner.summary.is_some() || inner.settled.len() < self.keys.len() {
            return;
        }
        self.state.send_modify(|s| s.completed = true);
        let summary = self.summary_from(self.state());
        debug!(
            target: "folio.download",
            tag = %self.tag,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "operation complete"
        );
        Self::emit(inner, &OperationEvent::Completed(summary.clone()));
        inner.summary = Some(summary);
        inner.subscribers.clear();
    }

    fn emit(inner: &mut Inner, event: &OperationEvent) {
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn summary_from(&self, state: OperationState) -> OperationSummary {
        OperationSummary {
            tag: self.tag.clone(),
            total: state.total,
            succeeded: state.succeeded,
            failed: state.failed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DownloadOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOperation")
            .field("tag", &self.tag)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
