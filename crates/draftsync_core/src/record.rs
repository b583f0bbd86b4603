//! Draft and remote document records with typed identifiers.

use crate::snapshot::DocumentSnapshot;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kind of document being edited (e.g. `"minor-works"`, `"eicr"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentType(String);

impl DocumentType {
    /// Creates a document type from a slug.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Returns the slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentType {
    fn from(slug: &str) -> Self {
        Self::new(slug)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identifier of a remotely persisted document.
///
/// Ids are assigned by the remote store on first create; a session starts
/// without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random id.
    ///
    /// Used by remote store implementations when creating documents.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for malformed input.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The identity of the authenticated document owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Generates a fresh random owner id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The storage key of a local draft: one draft per (type, id) pair.
///
/// `doc_id = None` is the **sentinel key**: an in-progress document that has
/// never been persisted remotely. It has a fixed key so a crash before the
/// first remote save can still be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftKey {
    /// The document type.
    pub doc_type: DocumentType,
    /// The remote id, or `None` for the unsaved sentinel draft.
    pub doc_id: Option<DocumentId>,
}

impl DraftKey {
    /// Creates a key for an id-assigned document.
    pub fn new(doc_type: DocumentType, doc_id: DocumentId) -> Self {
        Self {
            doc_type,
            doc_id: Some(doc_id),
        }
    }

    /// Creates the sentinel key for a never-yet-persisted document.
    pub fn unsaved(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            doc_id: None,
        }
    }

    /// Returns true if this is the unsaved sentinel key.
    pub fn is_unsaved(&self) -> bool {
        self.doc_id.is_none()
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.doc_id {
            Some(id) => write!(f, "{}/{}", self.doc_type, id),
            None => write!(f, "{}/unsaved", self.doc_type),
        }
    }
}

/// A locally persisted draft: one snapshot plus its local modification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    /// The document type.
    pub doc_type: DocumentType,
    /// The remote id, or `None` for the unsaved sentinel draft.
    pub doc_id: Option<DocumentId>,
    /// The snapshot at last local save.
    pub data: DocumentSnapshot,
    /// Local clock at the save call; compared against the remote
    /// `updated_at` during reconciliation.
    pub last_modified: Timestamp,
}

impl DraftRecord {
    /// Returns the storage key of this record.
    pub fn key(&self) -> DraftKey {
        DraftKey {
            doc_type: self.doc_type.clone(),
            doc_id: self.doc_id,
        }
    }
}

/// A document as held by the authoritative remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// The remote-assigned id.
    pub id: DocumentId,
    /// The snapshot at last remote write.
    pub data: DocumentSnapshot,
    /// Assigned by the store on every write — never by the client, so clock
    /// skew cannot forge conflict-resolution wins.
    pub updated_at: Timestamp,
}
