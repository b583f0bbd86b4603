//! Remote document store interface.

use crate::error::{SyncError, SyncResult};
use draftsync_core::{
    Clock, DocumentId, DocumentSnapshot, DocumentType, OwnerId, RemoteDocument, SystemClock,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The authoritative remote document store, as consumed by the engine.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP-backed, mock for testing, etc.). The engine never
/// owns transport; implementations are expected to bound each call with the
/// configured remote timeout and report an exceeded bound as
/// [`SyncError::Timeout`].
///
/// `updated_at` on returned documents is **assigned by the store**, never by
/// the client, so clock skew cannot forge conflict-resolution wins.
pub trait RemoteStore: Send + Sync {
    /// Creates a new document and returns its assigned id.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::Offline`]/[`SyncError::Timeout`] when the
    /// store is unreachable, or [`SyncError::Server`] on rejection.
    fn create(
        &self,
        owner: &OwnerId,
        doc_type: &DocumentType,
        data: &DocumentSnapshot,
    ) -> SyncResult<DocumentId>;

    /// Replaces the snapshot of an existing document.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::NotFound`] when no document exists under the
    /// id, in addition to the transport failures of [`RemoteStore::create`].
    fn update(&self, id: &DocumentId, owner: &OwnerId, data: &DocumentSnapshot) -> SyncResult<()>;

    /// Fetches a document by id.
    ///
    /// `Ok(None)` means the store holds no document under the id — the
    /// "no remote replica" case, not a failure.
    ///
    /// # Errors
    ///
    /// Fails with the transport failures of [`RemoteStore::create`].
    fn fetch_by_id(&self, id: &DocumentId, owner: &OwnerId) -> SyncResult<Option<RemoteDocument>>;
}

/// An in-memory remote store for testing.
///
/// Documents live in a map; connectivity can be toggled and single errors
/// injected to script failure scenarios. Write stamps come from the mock's
/// own clock, mirroring a real store's server-assigned `updated_at`.
pub struct MockRemoteStore {
    documents: RwLock<HashMap<DocumentId, RemoteDocument>>,
    owners: RwLock<HashMap<DocumentId, OwnerId>>,
    online: AtomicBool,
    fail_next: Mutex<Option<SyncError>>,
    clock: Arc<dyn Clock>,
}

impl MockRemoteStore {
    /// Creates an empty, online mock on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty, online mock on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            fail_next: Mutex::new(None),
            clock,
        }
    }

    /// Sets the reachability of the store.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes the next call fail with the given error.
    pub fn inject_error(&self, error: SyncError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Seeds a document, bypassing the trait surface.
    pub fn insert_document(&self, document: RemoteDocument, owner: OwnerId) {
        self.owners.write().insert(document.id, owner);
        self.documents.write().insert(document.id, document);
    }

    /// Returns a document by id, for assertions.
    pub fn document(&self, id: &DocumentId) -> Option<RemoteDocument> {
        self.documents.read().get(id).cloned()
    }

    /// Returns the number of stored documents.
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    fn check_reachable(&self) -> SyncResult<()> {
        if let Some(error) = self.fail_next.lock().take() {
            return Err(error);
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(SyncError::Offline);
        }
        Ok(())
    }
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MockRemoteStore {
    fn create(
        &self,
        owner: &OwnerId,
        _doc_type: &DocumentType,
        data: &DocumentSnapshot,
    ) -> SyncResult<DocumentId> {
        self.check_reachable()?;

        let id = DocumentId::random();
        let document = RemoteDocument {
            id,
            data: data.clone(),
            updated_at: self.clock.now(),
        };
        self.owners.write().insert(id, *owner);
        self.documents.write().insert(id, document);
        Ok(id)
    }

    fn update(&self, id: &DocumentId, owner: &OwnerId, data: &DocumentSnapshot) -> SyncResult<()> {
        self.check_reachable()?;

        if self.owners.read().get(id) != Some(owner) {
            return Err(SyncError::Server("permission denied".into()));
        }
        let mut documents = self.documents.write();
        let Some(document) = documents.get_mut(id) else {
            return Err(SyncError::NotFound(*id));
        };
        document.data = data.clone();
        document.updated_at = self.clock.now();
        Ok(())
    }

    fn fetch_by_id(&self, id: &DocumentId, owner: &OwnerId) -> SyncResult<Option<RemoteDocument>> {
        self.check_reachable()?;

        if self.owners.read().get(id) != Some(owner) {
            // Row-level security: foreign documents are invisible, not errors.
            return Ok(None);
        }
        Ok(self.documents.read().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(client: &str) -> DocumentSnapshot {
        let mut data = DocumentSnapshot::new();
        data.set("clientName", client);
        data
    }

    #[test]
    fn create_assigns_id_and_stamp() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();

        let id = store
            .create(&owner, &"minor-works".into(), &snapshot("a"))
            .unwrap();

        let document = store.document(&id).unwrap();
        assert_eq!(document.id, id);
        assert_eq!(document.data, snapshot("a"));
    }

    #[test]
    fn update_replaces_snapshot_and_restamps() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        let id = store
            .create(&owner, &"minor-works".into(), &snapshot("a"))
            .unwrap();

        store.update(&id, &owner, &snapshot("b")).unwrap();
        assert_eq!(store.document(&id).unwrap().data, snapshot("b"));
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        let id = DocumentId::random();

        let result = store.update(&id, &owner, &snapshot("x"));
        assert_eq!(result, Err(SyncError::NotFound(id)));
    }

    #[test]
    fn foreign_documents_are_invisible() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        let stranger = OwnerId::random();
        let id = store
            .create(&owner, &"eicr".into(), &snapshot("a"))
            .unwrap();

        assert_eq!(store.fetch_by_id(&id, &stranger).unwrap(), None);
        assert!(store.update(&id, &stranger, &snapshot("b")).is_err());
    }

    #[test]
    fn offline_store_refuses_all_calls() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        store.set_online(false);

        let result = store.create(&owner, &"eicr".into(), &snapshot("a"));
        assert_eq!(result, Err(SyncError::Offline));
    }

    #[test]
    fn injected_error_fires_once() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        store.inject_error(SyncError::Server("boom".into()));

        let first = store.create(&owner, &"eicr".into(), &snapshot("a"));
        assert_eq!(first, Err(SyncError::Server("boom".into())));

        let second = store.create(&owner, &"eicr".into(), &snapshot("a"));
        assert!(second.is_ok());
    }

    #[test]
    fn fetch_absent_is_none() {
        let store = MockRemoteStore::new();
        let owner = OwnerId::random();
        assert_eq!(
            store.fetch_by_id(&DocumentId::random(), &owner).unwrap(),
            None
        );
    }
}
