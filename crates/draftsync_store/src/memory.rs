//! In-memory draft store.

use crate::error::{StoreError, StoreResult};
use crate::store::DraftStore;
use draftsync_core::{Clock, DocumentSnapshot, DraftKey, DraftRecord, SystemClock};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// An in-memory draft store.
///
/// Suitable for unit tests, integration tests, and sessions that do not need
/// drafts to survive the process. An optional record-count capacity simulates
/// storage-quota exhaustion so eviction behavior can be exercised.
///
/// # Example
///
/// ```rust
/// use draftsync_core::{DocumentSnapshot, DraftKey};
/// use draftsync_store::{DraftStore, MemoryDraftStore};
///
/// let store = MemoryDraftStore::new();
/// let key = DraftKey::unsaved("minor-works".into());
/// let mut data = DocumentSnapshot::new();
/// data.set("clientName", "J. Bloggs");
///
/// let record = store.save(&key, &data).unwrap();
/// assert_eq!(store.load(&key).unwrap(), Some(record));
/// ```
pub struct MemoryDraftStore {
    records: RwLock<HashMap<DraftKey, DraftRecord>>,
    capacity: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl MemoryDraftStore {
    /// Creates an unbounded store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an unbounded store on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity: None,
            clock,
        }
    }

    /// Caps the store at `capacity` records to simulate quota exhaustion.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, key: &DraftKey, data: &DocumentSnapshot) -> StoreResult<DraftRecord> {
        let record = DraftRecord {
            doc_type: key.doc_type.clone(),
            doc_id: key.doc_id,
            data: data.clone(),
            last_modified: self.clock.now(),
        };

        let mut records = self.records.write();

        if let Some(capacity) = self.capacity {
            if !records.contains_key(key) && records.len() >= capacity {
                // Quota full: evict the oldest draft under a different key.
                let victim = records
                    .values()
                    .filter(|r| &r.key() != key)
                    .min_by_key(|r| r.last_modified)
                    .map(DraftRecord::key);

                match victim {
                    Some(victim) => {
                        tracing::warn!(%victim, "draft store full, evicting oldest draft");
                        records.remove(&victim);
                    }
                    None => return Err(StoreError::QuotaExceeded),
                }

                if records.len() >= capacity {
                    return Err(StoreError::QuotaExceeded);
                }
            }
        }

        records.insert(key.clone(), record.clone());
        Ok(record)
    }

    fn load(&self, key: &DraftKey) -> StoreResult<Option<DraftRecord>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn clear(&self, key: &DraftKey) -> StoreResult<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<DraftKey>> {
        Ok(self.records.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsync_core::{DocumentId, ManualClock, Timestamp};
    use std::time::Duration;

    fn snapshot(client: &str) -> DocumentSnapshot {
        let mut data = DocumentSnapshot::new();
        data.set("clientName", client);
        data
    }

    #[test]
    fn save_stamps_clock_at_call_time() {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(1_000)));
        let store = MemoryDraftStore::with_clock(clock.clone());
        let key = DraftKey::unsaved("minor-works".into());

        let first = store.save(&key, &snapshot("a")).unwrap();
        assert_eq!(first.last_modified, Timestamp::from_millis(1_000));

        clock.advance(Duration::from_millis(500));
        let second = store.save(&key, &snapshot("b")).unwrap();
        assert_eq!(second.last_modified, Timestamp::from_millis(1_500));
    }

    #[test]
    fn save_overwrites_same_key() {
        let store = MemoryDraftStore::new();
        let key = DraftKey::unsaved("minor-works".into());

        store.save(&key, &snapshot("a")).unwrap();
        store.save(&key, &snapshot("b")).unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.data, snapshot("b"));
    }

    #[test]
    fn load_absent_is_none() {
        let store = MemoryDraftStore::new();
        let key = DraftKey::new("eicr".into(), DocumentId::random());
        assert_eq!(store.load(&key).unwrap(), None);
    }

    #[test]
    fn clear_absent_is_ok() {
        let store = MemoryDraftStore::new();
        let key = DraftKey::unsaved("eicr".into());
        store.clear(&key).unwrap();
    }

    #[test]
    fn quota_evicts_oldest_unrelated_draft() {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(0)));
        let store = MemoryDraftStore::with_clock(clock.clone()).with_capacity(2);

        let oldest = DraftKey::new("eicr".into(), DocumentId::random());
        store.save(&oldest, &snapshot("old")).unwrap();

        clock.advance(Duration::from_millis(10));
        let newer = DraftKey::new("eicr".into(), DocumentId::random());
        store.save(&newer, &snapshot("newer")).unwrap();

        clock.advance(Duration::from_millis(10));
        let incoming = DraftKey::unsaved("minor-works".into());
        store.save(&incoming, &snapshot("incoming")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.load(&oldest).unwrap(), None);
        assert!(store.load(&newer).unwrap().is_some());
        assert!(store.load(&incoming).unwrap().is_some());
    }

    #[test]
    fn quota_with_nothing_evictable_fails() {
        let store = MemoryDraftStore::new().with_capacity(0);
        let key = DraftKey::unsaved("minor-works".into());

        let result = store.save(&key, &snapshot("a"));
        assert!(matches!(result, Err(StoreError::QuotaExceeded)));
    }

    #[test]
    fn resaving_existing_key_ignores_capacity() {
        let store = MemoryDraftStore::new().with_capacity(1);
        let key = DraftKey::unsaved("minor-works".into());

        store.save(&key, &snapshot("a")).unwrap();
        store.save(&key, &snapshot("b")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_returns_all_keys() {
        let store = MemoryDraftStore::new();
        let a = DraftKey::unsaved("minor-works".into());
        let b = DraftKey::new("eicr".into(), DocumentId::random());

        store.save(&a, &snapshot("a")).unwrap();
        store.save(&b, &snapshot("b")).unwrap();

        let mut keys = store.list().unwrap();
        keys.sort_by_key(|k| k.to_string());
        let mut expected = vec![a, b];
        expected.sort_by_key(|k| k.to_string());
        assert_eq!(keys, expected);
    }
}
