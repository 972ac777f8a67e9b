//! Download queue management.
//!
//! A pure state machine: no async, no I/O, no locking. The engine guards it
//! with a single mutex so offer-or-join and poll-and-remove are atomic.
//!
//! # Invariants
//!
//! - At most one entry per key, waiting or in flight. Offering a key that is
//!   waiting joins its entry; offering a key that is being fetched joins the
//!   fetch. Only [`Offer::Enqueued`] schedules a physical download.
//! - `High` entries always poll before `Normal` ones. Within a priority,
//!   entries poll in insertion order.
//! - A waiting `Normal` entry that receives a `High` offer moves to the back
//!   of the `High` lane.

mod types;

use std::collections::{HashMap, VecDeque};

use folio_core::{DownloadItem, DownloadPriority};

pub use types::{Offer, QueueEntry};

/// Deduplicating two-lane priority queue.
///
/// Generic over the operation handle so the state machine can be tested
/// without an engine.
pub struct DownloadQueue<O> {
    high: VecDeque<String>,
    normal: VecDeque<String>,
    waiting: HashMap<String, QueueEntry<O>>,
    /// Keys currently being fetched, with operations that joined mid-fetch.
    in_flight: HashMap<String, Vec<O>>,
}

impl<O> Default for DownloadQueue<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> DownloadQueue<O> {
    pub fn new() -> Self {
        Self {
            high: VecDeque::new(),
            normal: VecDeque::new(),
            waiting: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Number of entries waiting to be polled.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Number of keys being fetched.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_queued(&self, key: &str) -> bool {
        self.waiting.contains_key(key)
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Insert `item` for `operation`, or attach `operation` to the existing
    /// entry or fetch for the same key.
    pub fn offer_or_notify(&mut self, item: DownloadItem, operation: O) -> Offer {
        if let Some(joined) = self.in_flight.get_mut(&item.key) {
            joined.push(operation);
            return Offer::JoinedInFlight;
        }

        if let Some(entry) = self.waiting.get_mut(&item.key) {
            entry.operations.push(operation);
            if item.priority > entry.item.priority {
                entry.item.priority = item.priority;
                let key = item.key;
                self.normal.retain(|k| *k != key);
                self.high.push_back(key);
            }
            return Offer::Deduplicated;
        }

        let key = item.key.clone();
        match item.priority {
            DownloadPriority::High => self.high.push_back(key.clone()),
            DownloadPriority::Normal => self.normal.push_back(key.clone()),
        }
        self.waiting.insert(key, QueueEntry::new(item, operation));
        Offer::Enqueued
    }

    /// Remove the highest priority entry and mark its key in flight.
    ///
    /// The returned entry carries every operation that offered the key up to
    /// now. Operations joining later are handed out by [`Self::finish`].
    pub fn poll_with_operations(&mut self) -> Option<QueueEntry<O>> {
        let key = self.high.pop_front().or_else(|| self.normal.pop_front())?;
        let entry = self.waiting.remove(&key)?;
        self.in_flight.insert(key, Vec::new());
        Some(entry)
    }

    /// Clear the in-flight mark of `key`, returning operations that joined
    /// while it was being fetched.
    pub fn finish(&mut self, key: &str) -> Vec<O> {
        self.in_flight.remove(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, priority: DownloadPriority) -> DownloadItem {
        DownloadItem::new(key, format!("https://cdn/{key}"), format!("/data/{key}"))
            .with_priority(priority)
    }

    fn drain(queue: &mut DownloadQueue<&'static str>) -> Vec<(String, Vec<&'static str>)> {
        std::iter::from_fn(|| queue.poll_with_operations())
            .map(|entry| (entry.item.key, entry.operations))
            .collect()
    }

    #[test]
    fn test_empty_queue_polls_none() {
        let mut queue: DownloadQueue<&str> = DownloadQueue::new();
        assert!(queue.poll_with_operations().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_key_is_fetched_once_for_all_operations() {
        let mut queue = DownloadQueue::new();
        assert_eq!(
            queue.offer_or_notify(item("img.png", DownloadPriority::Normal), "A"),
            Offer::Enqueued
        );
        assert_eq!(
            queue.offer_or_notify(item("doc.html", DownloadPriority::Normal), "A"),
            Offer::Enqueued
        );
        assert_eq!(
            queue.offer_or_notify(item("img.png", DownloadPriority::High), "B"),
            Offer::Deduplicated
        );
        assert_eq!(queue.len(), 2);

        let first = queue.poll_with_operations().unwrap();
        assert_eq!(first.item.key, "img.png");
        assert_eq!(first.item.priority, DownloadPriority::High);
        assert_eq!(first.operations, vec!["A", "B"]);

        let second = queue.poll_with_operations().unwrap();
        assert_eq!(second.item.key, "doc.html");
        assert_eq!(second.operations, vec!["A"]);

        assert!(queue.poll_with_operations().is_none());
    }

    #[test]
    fn test_high_drains_before_normal_regardless_of_arrival() {
        let mut queue = DownloadQueue::new();
        queue.offer_or_notify(item("n1", DownloadPriority::Normal), "op");
        queue.offer_or_notify(item("n2", DownloadPriority::Normal), "op");
        queue.offer_or_notify(item("h1", DownloadPriority::High), "op");
        queue.offer_or_notify(item("n3", DownloadPriority::Normal), "op");
        queue.offer_or_notify(item("h2", DownloadPriority::High), "op");

        let order: Vec<String> = drain(&mut queue).into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["h1", "h2", "n1", "n2", "n3"]);
    }

    #[test]
    fn test_normal_offer_does_not_downgrade() {
        let mut queue = DownloadQueue::new();
        queue.offer_or_notify(item("n1", DownloadPriority::Normal), "A");
        queue.offer_or_notify(item("h1", DownloadPriority::High), "A");
        queue.offer_or_notify(item("h1", DownloadPriority::Normal), "B");

        let polled = drain(&mut queue);
        assert_eq!(polled[0], ("h1".to_string(), vec!["A", "B"]));
        assert_eq!(polled[1].0, "n1");
    }

    #[test]
    fn test_offer_during_fetch_joins_it() {
        let mut queue = DownloadQueue::new();
        queue.offer_or_notify(item("a.pdf", DownloadPriority::Normal), "A");
        let entry = queue.poll_with_operations().unwrap();
        assert!(queue.is_in_flight("a.pdf"));

        assert_eq!(
            queue.offer_or_notify(item("a.pdf", DownloadPriority::High), "B"),
            Offer::JoinedInFlight
        );
        assert!(queue.is_empty());

        assert_eq!(queue.finish(&entry.item.key), vec!["B"]);
        assert!(!queue.is_in_flight("a.pdf"));

        // once finished, the key can be scheduled again
        assert_eq!(
            queue.offer_or_notify(item("a.pdf", DownloadPriority::Normal), "C"),
            Offer::Enqueued
        );
    }

    #[test]
    fn test_finish_unknown_key_is_empty() {
        let mut queue: DownloadQueue<&str> = DownloadQueue::new();
        assert!(queue.finish("nothing").is_empty());
    }
}
