//! Save-trigger orchestration.
//!
//! One [`DraftSyncEngine`] instance per editing session, parameterized by
//! `(document type, optional document id)` and passed by reference to every
//! save trigger — there is no ambient singleton.

use crate::config::EngineConfig;
use crate::env::{
    AuthProvider, ConnectivityProvider, CooldownNotifier, Environment, FailureNotifier,
};
use crate::error::{SyncError, SyncResult};
use crate::queue::{OfflineQueue, QueuedMutation};
use crate::reconcile::{reconcile, ReplicaSource};
use crate::remote::RemoteStore;
use crate::state::{SyncState, SyncStats, SyncStatus};
use draftsync_core::{
    Clock, DocumentId, DocumentSnapshot, DocumentType, DraftKey, DraftRecord, OwnerId, Timestamp,
};
use draftsync_store::DraftStore;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The result of a successful persist call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote write completed.
    Synced {
        /// The document's remote id (assigned on first create).
        document_id: DocumentId,
    },
    /// The remote store was unreachable; the snapshot is saved locally and
    /// queued for replay.
    Queued,
}

/// The initial working snapshot and its resolved sync state.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// The winning snapshot after reconciliation.
    pub snapshot: DocumentSnapshot,
    /// The seeded sync state.
    pub state: SyncState,
}

/// The result of a queue flush.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushOutcome {
    /// Entries applied to the remote store.
    pub flushed: usize,
    /// Entries still queued (flush stops at the first failure).
    pub remaining: usize,
    /// The failure that stopped the flush, if any.
    pub error: Option<SyncError>,
}

/// The draft/cloud synchronization engine for one editing session.
///
/// Keeps one document durable across reloads, network loss, and multi-device
/// access by reconciling the local draft cache against the authoritative
/// remote store. Every persist writes the local draft **first** (synchronous
/// fast path), then attempts the remote write, routing unreachable-store
/// failures through the offline mutation queue.
///
/// # Concurrency
///
/// Single logical writer per session: a persist call while another is in
/// flight coalesces into the queue instead of racing. Across clients there
/// is no coordination — the last remote write wins by server timestamp, and
/// the next load silently discards older unsynced edits (accepted,
/// documented limitation).
pub struct DraftSyncEngine {
    doc_type: DocumentType,
    doc_id: RwLock<Option<DocumentId>>,
    config: EngineConfig,
    store: Arc<dyn DraftStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    connectivity: Arc<dyn ConnectivityProvider>,
    clock: Arc<dyn Clock>,
    notifier: CooldownNotifier,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    queue: Mutex<OfflineQueue>,
    in_flight: AtomicBool,
    dirty_since: Mutex<Option<Timestamp>>,
}

impl DraftSyncEngine {
    /// Creates an engine for one editing session.
    ///
    /// `doc_id` is `None` for a blank session; the id is adopted from the
    /// remote store on first successful create.
    pub fn new(
        doc_type: DocumentType,
        doc_id: Option<DocumentId>,
        config: EngineConfig,
        store: Arc<dyn DraftStore>,
        remote: Arc<dyn RemoteStore>,
        env: Environment,
    ) -> Self {
        let notifier = CooldownNotifier::new(env.notifier, env.clock.clone(), config.notify_cooldown);
        Self {
            doc_type,
            doc_id: RwLock::new(doc_id),
            config,
            store,
            remote,
            auth: env.auth,
            connectivity: env.connectivity,
            clock: env.clock,
            notifier,
            state: RwLock::new(SyncState::new()),
            stats: RwLock::new(SyncStats::default()),
            queue: Mutex::new(OfflineQueue::new()),
            in_flight: AtomicBool::new(false),
            dirty_since: Mutex::new(None),
        }
    }

    /// Returns the document type of this session.
    pub fn doc_type(&self) -> &DocumentType {
        &self.doc_type
    }

    /// Returns the remote id, once assigned.
    pub fn document_id(&self) -> Option<DocumentId> {
        *self.doc_id.read()
    }

    /// Returns the current sync state.
    pub fn state(&self) -> SyncState {
        self.state.read().clone()
    }

    /// Returns lifetime counters for this engine instance.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the number of queued mutations.
    pub fn queued_changes(&self) -> usize {
        self.queue.lock().len()
    }

    fn draft_key(&self) -> DraftKey {
        DraftKey {
            doc_type: self.doc_type.clone(),
            doc_id: *self.doc_id.read(),
        }
    }

    /// Loads both replicas, reconciles, and returns the working snapshot.
    ///
    /// Local-store failures are swallowed (treated as no local replica); a
    /// remote fetch that fails offline or finds nothing is treated as no
    /// remote replica; any other remote failure is reflected in the state
    /// but the local snapshot is still returned — loading never loses data.
    pub fn load_session(&self) -> LoadedSession {
        let key = self.draft_key();
        let local = match self.store.load(&key) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "local draft load failed");
                None
            }
        };

        let mut remote_error = None;
        let remote_doc = match (*self.doc_id.read(), self.auth.identity()) {
            (Some(id), Some(owner)) if self.connectivity.is_online() => {
                match self.remote.fetch_by_id(&id, &owner) {
                    Ok(doc) => doc,
                    Err(e) if e.is_offline() => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "remote fetch failed during load");
                        remote_error = Some(e);
                        None
                    }
                }
            }
            _ => None,
        };

        let reconciled = reconcile(local.as_ref(), remote_doc.as_ref());

        if reconciled.source == ReplicaSource::Remote {
            // Refresh the local cache with the adopted remote snapshot so a
            // later offline load starts from the same working copy.
            if let Err(e) = self.store.save(&key, &reconciled.snapshot) {
                tracing::error!(key = %key, error = %e, "local cache refresh failed");
            }
        }

        let state = {
            let mut state = self.state.write();
            if let Some(e) = remote_error {
                state.fail(&e);
            } else {
                match reconciled.source {
                    ReplicaSource::Empty => {}
                    ReplicaSource::Local => state.mark_dirty(),
                    ReplicaSource::Remote => {
                        state.complete_sync(
                            remote_doc.as_ref().map_or_else(|| self.clock.now(), |d| d.updated_at),
                        );
                    }
                }
            }
            state.clone()
        };

        tracing::debug!(key = %key, source = ?reconciled.source, "session loaded");
        LoadedSession {
            snapshot: reconciled.snapshot,
            state,
        }
    }

    /// Records a mutation of the working copy and anchors the autosave
    /// debounce window.
    pub fn note_mutation(&self) {
        *self.dirty_since.lock() = Some(self.clock.now());
        self.state.write().mark_dirty();
    }

    /// Explicit user save: local write first, then the remote attempt.
    ///
    /// Returns the assigned remote id on success, [`SaveOutcome::Queued`]
    /// when the store is unreachable (or a persist is already in flight),
    /// and errors for refused or rejected writes.
    ///
    /// # Errors
    ///
    /// [`SyncError::AuthRequired`] when unauthenticated (the sync state is
    /// left untouched and the remote store is never called); any
    /// non-offline remote failure, which ends the state `Errored`.
    pub fn save_now(&self, snapshot: &DocumentSnapshot) -> SyncResult<SaveOutcome> {
        self.save_local(snapshot);

        let Some(owner) = self.auth.identity() else {
            return Err(SyncError::AuthRequired);
        };

        if !self.connectivity.is_online() {
            let outcome = self.enqueue_pending(snapshot);
            *self.dirty_since.lock() = None;
            return Ok(outcome);
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            // Another persist from this client is in flight; never issue two
            // concurrent writers against the same remote document.
            let outcome = self.enqueue_pending(snapshot);
            *self.dirty_since.lock() = None;
            return Ok(outcome);
        }

        self.state.write().begin_sync();
        let target = *self.doc_id.read();
        let doc_type = self.doc_type.clone();
        let result = self.push_one(&owner, &doc_type, target, snapshot);

        let outcome = match result {
            Ok(id) => {
                self.stats.write().saves_completed += 1;
                self.state.write().complete_sync(self.clock.now());
                if !self.queue.lock().is_empty() {
                    // Mutations captured while this write was in flight.
                    self.run_flush(&owner);
                }
                Ok(SaveOutcome::Synced { document_id: id })
            }
            Err(e) if e.is_offline() => {
                self.state.write().abort_sync();
                Ok(self.enqueue_pending(snapshot))
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote write rejected");
                self.state.write().fail(&e);
                Err(e)
            }
        };

        self.in_flight.store(false, Ordering::SeqCst);
        if outcome.is_ok() {
            *self.dirty_since.lock() = None;
        }
        outcome
    }

    /// Returns true if the debounce window since the last mutation has
    /// elapsed and an autosave should fire.
    pub fn autosave_due(&self) -> bool {
        let Some(anchor) = *self.dirty_since.lock() else {
            return false;
        };
        self.state.read().status == SyncStatus::Dirty
            && self.clock.now().saturating_since(anchor) >= self.config.autosave_debounce
    }

    /// Background autosave: the same path as [`DraftSyncEngine::save_now`],
    /// but failures are silent — reflected only in the sync state and the
    /// rate-limited failure notifier.
    pub fn autosave(&self, snapshot: &DocumentSnapshot) {
        if let Err(e) = self.save_now(snapshot) {
            self.notifier.notify(&format!("autosave failed: {e}"));
        }
    }

    /// Unload-safety save: local-only, synchronous, unconditional.
    ///
    /// Never touches the state machine, the network, or anything that could
    /// suspend; failures are swallowed and logged.
    pub fn save_on_unload(&self, snapshot: &DocumentSnapshot) {
        self.save_local(snapshot);
    }

    /// Replays queued mutations in insertion order, stopping at the first
    /// failure.
    ///
    /// Exposed for the explicit "retry sync" action; also invoked from
    /// [`DraftSyncEngine::handle_connectivity_restored`].
    ///
    /// # Errors
    ///
    /// [`SyncError::AuthRequired`] when unauthenticated; transport and
    /// server failures are reported inside the returned outcome instead.
    pub fn flush_queue(&self) -> SyncResult<FlushOutcome> {
        let Some(owner) = self.auth.identity() else {
            return Err(SyncError::AuthRequired);
        };

        if self.in_flight.swap(true, Ordering::SeqCst) {
            // The in-flight persist drains the queue when it completes.
            return Ok(FlushOutcome {
                flushed: 0,
                remaining: self.queue.lock().len(),
                error: None,
            });
        }

        let outcome = self.run_flush(&owner);
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    /// Connectivity-restored signal: flushes if anything is queued.
    pub fn handle_connectivity_restored(&self) {
        if self.queue.lock().is_empty() {
            return;
        }
        tracing::debug!("connectivity restored, flushing offline queue");
        match self.flush_queue() {
            Ok(outcome) => {
                tracing::debug!(flushed = outcome.flushed, remaining = outcome.remaining, "flush finished")
            }
            Err(e) => tracing::warn!(error = %e, "flush on reconnect refused"),
        }
    }

    /// Returns the unsaved sentinel draft, if one is recoverable.
    ///
    /// A draft is recoverable when this session has no remote id yet and a
    /// non-empty sentinel record exists — the crash-before-first-save case.
    pub fn recoverable_draft(&self) -> Option<DraftRecord> {
        if self.doc_id.read().is_some() {
            return None;
        }
        let sentinel = DraftKey::unsaved(self.doc_type.clone());
        match self.store.load(&sentinel) {
            Ok(record) => record.filter(|r| !r.data.is_empty()),
            Err(e) => {
                tracing::error!(error = %e, "recoverable draft scan failed");
                None
            }
        }
    }

    /// Adopts the recoverable sentinel draft as the working copy.
    ///
    /// Marks the session dirty, since recovered content is unsynced.
    pub fn recover_draft(&self) -> Option<DocumentSnapshot> {
        let record = self.recoverable_draft()?;
        self.note_mutation();
        Some(record.data)
    }

    /// Discards the unsaved sentinel draft.
    pub fn discard_draft(&self) {
        let sentinel = DraftKey::unsaved(self.doc_type.clone());
        if let Err(e) = self.store.clear(&sentinel) {
            tracing::error!(error = %e, "draft discard failed");
        }
    }

    fn save_local(&self, snapshot: &DocumentSnapshot) {
        let key = self.draft_key();
        match self.store.save(&key, snapshot) {
            Ok(record) => {
                self.stats.write().last_local_save = Some(record.last_modified);
            }
            Err(e) => {
                // Best-effort cache, but the crash-recovery source of truth.
                tracing::error!(key = %key, error = %e, "local draft save failed");
            }
        }
    }

    fn enqueue_pending(&self, snapshot: &DocumentSnapshot) -> SaveOutcome {
        let mutation = QueuedMutation {
            doc_type: self.doc_type.clone(),
            doc_id: *self.doc_id.read(),
            data: snapshot.clone(),
            enqueued_at: self.clock.now(),
        };
        let (coalesced, queued) = {
            let mut queue = self.queue.lock();
            let coalesced = queue.enqueue(mutation);
            (coalesced, queue.len())
        };
        if coalesced {
            self.stats.write().mutations_coalesced += 1;
        }
        self.state.write().note_queued(queued);
        tracing::debug!(queued, coalesced, "snapshot queued for replay");
        SaveOutcome::Queued
    }

    fn push_one(
        &self,
        owner: &OwnerId,
        doc_type: &DocumentType,
        target: Option<DocumentId>,
        data: &DocumentSnapshot,
    ) -> SyncResult<DocumentId> {
        match target {
            Some(id) => {
                self.remote.update(&id, owner, data)?;
                self.stats.write().updates += 1;
                Ok(id)
            }
            None => {
                let id = self.remote.create(owner, doc_type, data)?;
                self.stats.write().creates += 1;
                self.adopt_id(id);
                Ok(id)
            }
        }
    }

    /// Records the remote-assigned id and migrates the sentinel draft to an
    /// id-keyed record.
    fn adopt_id(&self, id: DocumentId) {
        *self.doc_id.write() = Some(id);
        tracing::debug!(%id, "remote id assigned");

        let sentinel = DraftKey::unsaved(self.doc_type.clone());
        match self.store.load(&sentinel) {
            Ok(Some(record)) => {
                let key = DraftKey::new(self.doc_type.clone(), id);
                if let Err(e) = self.store.save(&key, &record.data) {
                    tracing::error!(key = %key, error = %e, "draft migration save failed");
                    return;
                }
                if let Err(e) = self.store.clear(&sentinel) {
                    tracing::error!(error = %e, "sentinel draft cleanup failed");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "draft migration load failed"),
        }
    }

    /// Drains the queue in insertion order. Caller holds the in-flight flag.
    fn run_flush(&self, owner: &OwnerId) -> FlushOutcome {
        self.stats.write().flush_cycles += 1;
        let mut flushed = 0usize;
        let mut error = None;

        loop {
            let Some(entry) = self.queue.lock().front().cloned() else {
                break;
            };
            self.state.write().begin_sync();
            let target = entry.doc_id.or(*self.doc_id.read());
            match self.push_one(owner, &entry.doc_type, target, &entry.data) {
                Ok(_) => {
                    let remaining = {
                        let mut queue = self.queue.lock();
                        queue.pop_front();
                        queue.len()
                    };
                    flushed += 1;
                    self.stats.write().saves_completed += 1;
                    let mut state = self.state.write();
                    state.note_dequeued(remaining);
                    state.complete_sync(self.clock.now());
                }
                Err(e) if e.is_offline() => {
                    tracing::debug!("still offline, queue flush deferred");
                    self.state.write().abort_sync();
                    error = Some(e);
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "queue flush stopped at first failure");
                    self.state.write().fail(&e);
                    error = Some(e);
                    break;
                }
            }
        }

        FlushOutcome {
            flushed,
            remaining: self.queue.lock().len(),
            error,
        }
    }
}
