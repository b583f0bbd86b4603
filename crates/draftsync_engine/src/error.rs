//! Error types for the sync engine.

use draftsync_core::DocumentId;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The network is unreachable.
    ///
    /// Routed to the offline mutation queue; the session keeps working.
    #[error("network unreachable")]
    Offline,

    /// A remote call exceeded its bounded timeout.
    ///
    /// Treated identically to [`SyncError::Offline`] for queuing purposes.
    #[error("remote call timed out")]
    Timeout,

    /// No authenticated session.
    ///
    /// Persist attempts are refused outright and surfaced to the caller;
    /// the sync state is left untouched.
    #[error("no authenticated session")]
    AuthRequired,

    /// The remote store has no document under the given id.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// The remote store rejected the request.
    ///
    /// Never auto-queued: retrying a server-side rejection without user
    /// action would hammer a persistent validation failure.
    #[error("server error: {0}")]
    Server(String),
}

impl SyncError {
    /// Returns true if this error means the remote store is unreachable
    /// and the mutation should be queued for replay.
    pub fn is_offline(&self) -> bool {
        matches!(self, SyncError::Offline | SyncError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_classification() {
        assert!(SyncError::Offline.is_offline());
        assert!(SyncError::Timeout.is_offline());
        assert!(!SyncError::AuthRequired.is_offline());
        assert!(!SyncError::Server("rejected".into()).is_offline());
        assert!(!SyncError::NotFound(DocumentId::random()).is_offline());
    }

    #[test]
    fn error_display() {
        assert_eq!(SyncError::Offline.to_string(), "network unreachable");
        assert_eq!(
            SyncError::Server("row violates policy".into()).to_string(),
            "server error: row violates policy"
        );
    }
}
