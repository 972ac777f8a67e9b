//! Queue entry types (internal implementation).

use folio_core::DownloadItem;

/// Outcome of offering an item to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// A new entry was created; a fetch will be scheduled.
    Enqueued,
    /// The key was already waiting; the operation joined that entry.
    Deduplicated,
    /// The key is being fetched right now; the operation joined that fetch.
    JoinedInFlight,
}

impl Offer {
    /// Whether a new physical fetch was scheduled.
    pub const fn is_new(self) -> bool {
        matches!(self, Self::Enqueued)
    }
}

/// A queued item together with every operation waiting for it.
#[derive(Debug, Clone)]
pub struct QueueEntry<O> {
    pub item: DownloadItem,
    pub operations: Vec<O>,
}

impl<O> QueueEntry<O> {
    pub fn new(item: DownloadItem, operation: O) -> Self {
        Self {
            item,
            operations: vec![operation],
        }
    }

    pub fn key(&self) -> &str {
        &self.item.key
    }
}
