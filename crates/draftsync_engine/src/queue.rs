//! Offline mutation queue.

use draftsync_core::{DocumentId, DocumentSnapshot, DocumentType, Timestamp};
use std::collections::VecDeque;

/// A pending "write this snapshot" intent that could not reach the remote
/// store.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMutation {
    /// The document type.
    pub doc_type: DocumentType,
    /// The remote id, or `None` when the document has never been created.
    pub doc_id: Option<DocumentId>,
    /// The snapshot to write.
    pub data: DocumentSnapshot,
    /// When the mutation was (last) enqueued.
    pub enqueued_at: Timestamp,
}

impl QueuedMutation {
    fn same_document(&self, other: &QueuedMutation) -> bool {
        self.doc_type == other.doc_type && self.doc_id == other.doc_id
    }
}

/// A coalescing FIFO of pending remote writes.
///
/// This is a **coalescing queue, not an event log**: only the latest
/// snapshot per document matters, so a new mutation for an already-queued
/// document replaces the queued entry in place — position preserved, payload
/// and `enqueued_at` refreshed. Flushing applies entries strictly in
/// insertion order and stops at the first failure, leaving the failed entry
/// and everything behind it queued (no out-of-order application).
#[derive(Debug, Default)]
pub struct OfflineQueue {
    entries: VecDeque<QueuedMutation>,
}

impl OfflineQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mutation, coalescing with any queued entry for the same
    /// document.
    ///
    /// Returns true if an existing entry was superseded.
    pub fn enqueue(&mut self, mutation: QueuedMutation) -> bool {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.same_document(&mutation))
        {
            tracing::debug!(doc_type = %mutation.doc_type, "coalescing queued mutation");
            *existing = mutation;
            return true;
        }
        self.entries.push_back(mutation);
        false
    }

    /// Returns the oldest entry without removing it.
    pub fn front(&self) -> Option<&QueuedMutation> {
        self.entries.front()
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<QueuedMutation> {
        self.entries.pop_front()
    }

    /// Returns the number of queued mutations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates entries in flush order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedMutation> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mutation(doc_id: Option<DocumentId>, client: &str, at: u64) -> QueuedMutation {
        let mut data = DocumentSnapshot::new();
        data.set("clientName", client);
        QueuedMutation {
            doc_type: "minor-works".into(),
            doc_id,
            data,
            enqueued_at: Timestamp::from_millis(at),
        }
    }

    #[test]
    fn enqueue_appends_distinct_documents() {
        let mut queue = OfflineQueue::new();
        let a = DocumentId::random();
        let b = DocumentId::random();

        assert!(!queue.enqueue(mutation(Some(a), "a", 1)));
        assert!(!queue.enqueue(mutation(Some(b), "b", 2)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn enqueue_coalesces_same_document() {
        let mut queue = OfflineQueue::new();
        let id = DocumentId::random();

        assert!(!queue.enqueue(mutation(Some(id), "first", 1)));
        assert!(queue.enqueue(mutation(Some(id), "second", 2)));

        assert_eq!(queue.len(), 1);
        let entry = queue.front().unwrap();
        assert_eq!(entry.data.get("clientName").unwrap().as_str(), Some("second"));
        assert_eq!(entry.enqueued_at, Timestamp::from_millis(2));
    }

    #[test]
    fn coalescing_preserves_position() {
        let mut queue = OfflineQueue::new();
        let first = DocumentId::random();
        let second = DocumentId::random();

        queue.enqueue(mutation(Some(first), "first-v1", 1));
        queue.enqueue(mutation(Some(second), "second", 2));
        queue.enqueue(mutation(Some(first), "first-v2", 3));

        let order: Vec<Option<DocumentId>> = queue.iter().map(|m| m.doc_id).collect();
        assert_eq!(order, vec![Some(first), Some(second)]);
        assert_eq!(
            queue.front().unwrap().data.get("clientName").unwrap().as_str(),
            Some("first-v2")
        );
    }

    #[test]
    fn sentinel_mutations_coalesce_too() {
        let mut queue = OfflineQueue::new();

        queue.enqueue(mutation(None, "draft-v1", 1));
        assert!(queue.enqueue(mutation(None, "draft-v2", 2)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pop_front_is_fifo() {
        let mut queue = OfflineQueue::new();
        let a = DocumentId::random();
        let b = DocumentId::random();

        queue.enqueue(mutation(Some(a), "a", 1));
        queue.enqueue(mutation(Some(b), "b", 2));

        assert_eq!(queue.pop_front().unwrap().doc_id, Some(a));
        assert_eq!(queue.pop_front().unwrap().doc_id, Some(b));
        assert!(queue.pop_front().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = OfflineQueue::new();
        queue.enqueue(mutation(None, "x", 1));
        queue.clear();
        assert!(queue.is_empty());
    }
}
