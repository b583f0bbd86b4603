//! Replica reconciliation.
//!
//! Pure decision function between the two timestamped replicas of one
//! document. Deterministic and side-effect-free, so it is unit-testable
//! without network or storage doubles.

use draftsync_core::{DocumentSnapshot, DraftRecord, RemoteDocument};

/// Which replica supplied the winning snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaSource {
    /// The local draft won.
    Local,
    /// The remote document won (or tied — remote is authoritative).
    Remote,
    /// Neither replica exists; the snapshot is empty.
    Empty,
}

/// The outcome of reconciling two replicas.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The winning snapshot, adopted verbatim.
    pub snapshot: DocumentSnapshot,
    /// Which side it came from.
    pub source: ReplicaSource,
}

/// Chooses the working snapshot between a local draft and a remote document.
///
/// The strictly later timestamp wins **in full**: the winning snapshot is
/// adopted verbatim, including every named array field — no field-level
/// merge, so partial arrays never interleave between replicas and stale
/// sub-fields can never resurrect. Equal timestamps (which occur only
/// immediately after a successful sync) resolve to the remote snapshot,
/// since remote is authoritative once synced.
pub fn reconcile(local: Option<&DraftRecord>, remote: Option<&RemoteDocument>) -> Reconciled {
    match (local, remote) {
        (None, None) => Reconciled {
            snapshot: DocumentSnapshot::new(),
            source: ReplicaSource::Empty,
        },
        (Some(local), None) => Reconciled {
            snapshot: local.data.clone(),
            source: ReplicaSource::Local,
        },
        (None, Some(remote)) => Reconciled {
            snapshot: remote.data.clone(),
            source: ReplicaSource::Remote,
        },
        (Some(local), Some(remote)) => {
            if local.last_modified > remote.updated_at {
                Reconciled {
                    snapshot: local.data.clone(),
                    source: ReplicaSource::Local,
                }
            } else {
                Reconciled {
                    snapshot: remote.data.clone(),
                    source: ReplicaSource::Remote,
                }
            }
        }
    }
}
