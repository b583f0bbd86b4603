//! Draft store trait definition.

use crate::error::StoreResult;
use draftsync_core::{DocumentSnapshot, DraftKey, DraftRecord};

/// Durable, synchronous, process-local persistence for draft snapshots.
///
/// A draft store holds **one record per key**: the pair of document type and
/// remote id, or the unsaved sentinel when no id exists yet. Stores are a
/// best-effort cache for sync correctness but the source of truth for crash
/// recovery, so callers swallow store failures while logging them at high
/// severity.
///
/// # Invariants
///
/// - Every operation completes synchronously without awaiting — the
///   unload-safety save path calls `save` with the page being torn down
/// - `save` stamps `last_modified` from the store's clock at call time
/// - `save` overwrites any previous record under the same key
/// - On quota exhaustion, `save` evicts the oldest draft under a *different*
///   key and retries once before returning [`crate::StoreError::QuotaExceeded`]
///
/// # Implementors
///
/// - [`crate::MemoryDraftStore`] - for tests and ephemeral sessions
/// - [`crate::FileDraftStore`] - for persistent storage
pub trait DraftStore: Send + Sync {
    /// Persists a snapshot under the given key, stamping `last_modified`.
    ///
    /// Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written, or if
    /// the quota is exhausted and eviction freed nothing.
    fn save(&self, key: &DraftKey, data: &DocumentSnapshot) -> StoreResult<DraftRecord>;

    /// Loads the record under the given key, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored record exists but cannot be read or
    /// decoded.
    fn load(&self, key: &DraftKey) -> StoreResult<Option<DraftRecord>>;

    /// Removes the record under the given key.
    ///
    /// Removing an absent record is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    fn clear(&self, key: &DraftKey) -> StoreResult<()>;

    /// Lists the keys of all stored drafts.
    ///
    /// Used for eviction and recovery scans.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> StoreResult<Vec<DraftKey>>;
}
