//! Error types for draft storage.

use std::io;
use thiserror::Error;

/// Result type for draft store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in draft store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage quota exhausted and eviction could not free space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// A stored draft could not be decoded.
    #[error("draft record corrupted: {0}")]
    Corrupted(String),

    /// A draft could not be encoded for storage.
    #[error("codec error: {0}")]
    Codec(String),
}
