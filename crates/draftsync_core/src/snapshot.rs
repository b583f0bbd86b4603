//! Document snapshots.

use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete, serializable copy of a document's field values at one instant.
///
/// Snapshots are **opaque, atomic blobs** to the engine: reconciliation adopts
/// a whole snapshot verbatim and never merges individual fields between
/// replicas. Field order is deterministic (sorted by name) so encodings are
/// stable across processes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentSnapshot {
    /// Creates a new empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Returns true if a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the snapshot has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for DocumentSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
