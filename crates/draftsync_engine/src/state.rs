//! Sync state machine.

use crate::error::SyncError;
use draftsync_core::Timestamp;
use serde::Serialize;

/// The UI-visible status of the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    /// Nothing to persist; no session activity yet.
    Idle,
    /// The working copy has unsynced mutations.
    Dirty,
    /// A remote write is in flight.
    Syncing,
    /// Local and remote replicas agree.
    Synced,
    /// Mutations are waiting in the offline queue.
    Queued,
    /// The remote store rejected a write; manual retry required.
    Errored,
}

impl SyncStatus {
    /// Returns true if a remote write is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncStatus::Syncing)
    }

    /// Returns true if unsynced work exists.
    pub fn has_unsynced_work(&self) -> bool {
        matches!(
            self,
            SyncStatus::Dirty | SyncStatus::Queued | SyncStatus::Errored
        )
    }
}

/// Snapshot of the sync state machine.
///
/// Invariant: `queued_changes > 0` implies `status` is `Queued` or `Syncing`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    /// Current status.
    pub status: SyncStatus,
    /// Number of mutations waiting in the offline queue.
    pub queued_changes: usize,
    /// Instant of the last successful remote write.
    pub last_sync_time: Option<Timestamp>,
    /// Message of the last remote failure, cleared on success.
    pub last_error: Option<String>,
}

impl SyncState {
    /// Creates the initial idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: SyncStatus::Idle,
            queued_changes: 0,
            last_sync_time: None,
            last_error: None,
        }
    }

    /// Records a mutation of the working copy.
    ///
    /// `Syncing` and `Queued` are left alone — the mutation will be captured
    /// by the next persist or coalesced into the queue.
    pub fn mark_dirty(&mut self) {
        if !matches!(self.status, SyncStatus::Syncing | SyncStatus::Queued) {
            self.status = SyncStatus::Dirty;
        }
        self.check();
    }

    /// Enters `Syncing` for a persist or flush attempt.
    pub fn begin_sync(&mut self) {
        self.status = SyncStatus::Syncing;
        self.check();
    }

    /// Records a successful remote write at `now`.
    ///
    /// Ends `Synced` unless mutations remain queued (captured while the
    /// write was in flight), in which case the queue still owns the status.
    pub fn complete_sync(&mut self, now: Timestamp) {
        self.last_sync_time = Some(now);
        self.last_error = None;
        self.status = if self.queued_changes > 0 {
            SyncStatus::Queued
        } else {
            SyncStatus::Synced
        };
        self.check();
    }

    /// Leaves `Syncing` without a completed write.
    pub fn abort_sync(&mut self) {
        self.status = if self.queued_changes > 0 {
            SyncStatus::Queued
        } else {
            SyncStatus::Dirty
        };
        self.check();
    }

    /// Records the new queue length after an enqueue.
    pub fn note_queued(&mut self, queued: usize) {
        self.queued_changes = queued;
        if !self.status.is_busy() {
            self.status = SyncStatus::Queued;
        }
        self.check();
    }

    /// Records the new queue length after a successful flush entry.
    pub fn note_dequeued(&mut self, remaining: usize) {
        self.queued_changes = remaining;
        self.check();
    }

    /// Records a remote failure.
    ///
    /// Ends `Errored` when nothing is queued; with a non-empty queue the
    /// status stays `Queued` (the invariant binds it) and the failure is
    /// kept in `last_error`.
    pub fn fail(&mut self, error: &SyncError) {
        self.last_error = Some(error.to_string());
        self.status = if self.queued_changes > 0 {
            SyncStatus::Queued
        } else {
            SyncStatus::Errored
        };
        self.check();
    }

    fn check(&self) {
        debug_assert!(
            self.queued_changes == 0
                || matches!(self.status, SyncStatus::Queued | SyncStatus::Syncing),
            "queued_changes > 0 requires Queued or Syncing, got {:?}",
            self.status
        );
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters over one engine instance's lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    /// Successful remote writes (creates plus updates, direct or flushed).
    pub saves_completed: u64,
    /// Remote documents created.
    pub creates: u64,
    /// Remote documents updated.
    pub updates: u64,
    /// Mutations coalesced into an existing queue entry.
    pub mutations_coalesced: u64,
    /// Queue flush attempts.
    pub flush_cycles: u64,
    /// Instant of the last local draft save.
    pub last_local_save: Option<Timestamp>,
}
