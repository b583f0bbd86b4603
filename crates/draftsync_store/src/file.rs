//! File-based draft store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::store::DraftStore;
use draftsync_core::{Clock, DocumentSnapshot, DraftKey, DraftRecord, SystemClock};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file-based draft store.
///
/// Stores one CBOR-encoded record per draft under a root directory:
/// `<type>--<id>.draft`, with the unsaved sentinel draft at
/// `<type>--unsaved.draft`. Records survive process restarts.
///
/// # Durability
///
/// Writes go to a temporary file which is synced and renamed into place, so
/// a crash mid-save leaves the previous record intact.
///
/// # Thread Safety
///
/// All state lives on the filesystem; the store is freely shareable.
///
/// # Example
///
/// ```no_run
/// use draftsync_core::{DocumentSnapshot, DraftKey};
/// use draftsync_store::{DraftStore, FileDraftStore};
/// use std::path::Path;
///
/// let store = FileDraftStore::open(Path::new("drafts")).unwrap();
/// let key = DraftKey::unsaved("minor-works".into());
/// store.save(&key, &DocumentSnapshot::new()).unwrap();
/// ```
pub struct FileDraftStore {
    root: PathBuf,
    max_drafts: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl FileDraftStore {
    /// Opens or creates a draft store rooted at the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        Self::open_with_clock(root, Arc::new(SystemClock))
    }

    /// Opens a draft store on the given clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_clock(root: &Path, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            max_drafts: None,
            clock,
        })
    }

    /// Caps the store at `max_drafts` records, evicting as quota demands.
    #[must_use]
    pub fn with_max_drafts(mut self, max_drafts: usize) -> Self {
        self.max_drafts = Some(max_drafts);
        self
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &DraftKey) -> PathBuf {
        let type_stem: String = key
            .doc_type
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let id_stem = match &key.doc_id {
            Some(id) => id.to_string(),
            None => "unsaved".to_string(),
        };
        self.root.join(format!("{type_stem}--{id_stem}.draft"))
    }

    fn read_record(path: &Path) -> StoreResult<DraftRecord> {
        let bytes = fs::read(path)?;
        ciborium::de::from_reader(bytes.as_slice())
            .map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    fn write_record(&self, path: &Path, record: &DraftRecord) -> StoreResult<()> {
        let mut encoded = Vec::new();
        ciborium::ser::into_writer(record, &mut encoded)
            .map_err(|e| StoreError::Codec(e.to_string()))?;

        let tmp = path.with_extension("draft.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&encoded)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Scans all records, skipping files that cannot be decoded.
    fn scan(&self) -> StoreResult<Vec<(PathBuf, DraftRecord)>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("draft") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => records.push((path, record)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable draft")
                }
            }
        }
        Ok(records)
    }

    /// Evicts the oldest draft whose key differs from `keep`.
    ///
    /// Returns true if a record was removed.
    fn evict_oldest_other(&self, keep: &DraftKey) -> StoreResult<bool> {
        let victim = self
            .scan()?
            .into_iter()
            .filter(|(_, record)| &record.key() != keep)
            .min_by_key(|(_, record)| record.last_modified);

        match victim {
            Some((path, record)) => {
                tracing::warn!(victim = %record.key(), "draft store full, evicting oldest draft");
                fs::remove_file(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn at_capacity(&self, key: &DraftKey) -> StoreResult<bool> {
        let Some(max) = self.max_drafts else {
            return Ok(false);
        };
        if self.path_for(key).exists() {
            // Overwrites do not grow the store.
            return Ok(false);
        }
        Ok(self.scan()?.len() >= max)
    }
}

// ENOSPC; `io::ErrorKind::StorageFull` is not yet stable on our MSRV.
fn is_disk_full(e: &io::Error) -> bool {
    e.raw_os_error() == Some(28)
}

impl DraftStore for FileDraftStore {
    fn save(&self, key: &DraftKey, data: &DocumentSnapshot) -> StoreResult<DraftRecord> {
        let record = DraftRecord {
            doc_type: key.doc_type.clone(),
            doc_id: key.doc_id,
            data: data.clone(),
            last_modified: self.clock.now(),
        };
        let path = self.path_for(key);

        if self.at_capacity(key)? && !self.evict_oldest_other(key)? {
            return Err(StoreError::QuotaExceeded);
        }

        match self.write_record(&path, &record) {
            Err(StoreError::Io(e)) if is_disk_full(&e) => {
                if !self.evict_oldest_other(key)? {
                    return Err(StoreError::QuotaExceeded);
                }
                match self.write_record(&path, &record) {
                    Err(StoreError::Io(e)) if is_disk_full(&e) => Err(StoreError::QuotaExceeded),
                    other => other.map(|()| record),
                }
            }
            other => other.map(|()| record),
        }
    }

    fn load(&self, key: &DraftKey) -> StoreResult<Option<DraftRecord>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let record = Self::read_record(&path)?;
        // Sanitized file stems can collide across document types.
        if &record.key() != key {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn clear(&self, key: &DraftKey) -> StoreResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<DraftKey>> {
        Ok(self
            .scan()?
            .into_iter()
            .map(|(_, record)| record.key())
            .collect())
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
        data.set("bondingWater", true);
        data
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = DraftKey::unsaved("minor-works".into());

        let saved = store.save(&key, &snapshot("J. Bloggs")).unwrap();
        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.data, snapshot("J. Bloggs"));
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = DraftKey::new("eicr".into(), DocumentId::random());

        {
            let store = FileDraftStore::open(dir.path()).unwrap();
            store.save(&key, &snapshot("persisted")).unwrap();
        }

        let reopened = FileDraftStore::open(dir.path()).unwrap();
        let loaded = reopened.load(&key).unwrap().unwrap();
        assert_eq!(loaded.data, snapshot("persisted"));
    }

    #[test]
    fn load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = DraftKey::unsaved("minor-works".into());
        assert_eq!(store.load(&key).unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = DraftKey::unsaved("minor-works".into());

        store.save(&key, &snapshot("x")).unwrap();
        store.clear(&key).unwrap();
        store.clear(&key).unwrap();
        assert_eq!(store.load(&key).unwrap(), None);
    }

    #[test]
    fn corrupted_file_reports_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = DraftKey::unsaved("minor-works".into());

        store.save(&key, &snapshot("x")).unwrap();
        fs::write(store.path_for(&key), b"not cbor").unwrap();

        assert!(matches!(store.load(&key), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn list_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();

        store
            .save(&DraftKey::unsaved("minor-works".into()), &snapshot("ok"))
            .unwrap();
        fs::write(dir.path().join("junk.draft"), b"garbage").unwrap();

        let keys = store.list().unwrap();
        assert_eq!(keys, vec![DraftKey::unsaved("minor-works".into())]);
    }

    #[test]
    fn quota_evicts_oldest_unrelated_draft() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(0)));
        let store = FileDraftStore::open_with_clock(dir.path(), clock.clone())
            .unwrap()
            .with_max_drafts(2);

        let oldest = DraftKey::new("eicr".into(), DocumentId::random());
        store.save(&oldest, &snapshot("old")).unwrap();

        clock.advance(Duration::from_millis(10));
        let newer = DraftKey::new("eicr".into(), DocumentId::random());
        store.save(&newer, &snapshot("newer")).unwrap();

        clock.advance(Duration::from_millis(10));
        let incoming = DraftKey::unsaved("minor-works".into());
        store.save(&incoming, &snapshot("incoming")).unwrap();

        assert_eq!(store.load(&oldest).unwrap(), None);
        assert!(store.load(&newer).unwrap().is_some());
        assert!(store.load(&incoming).unwrap().is_some());
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn overwrite_ignores_quota_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap().with_max_drafts(1);
        let key = DraftKey::unsaved("minor-works".into());

        store.save(&key, &snapshot("a")).unwrap();
        store.save(&key, &snapshot("b")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn sentinel_and_id_key_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();

        let sentinel = DraftKey::unsaved("minor-works".into());
        let id_key = DraftKey::new("minor-works".into(), DocumentId::random());

        store.save(&sentinel, &snapshot("unsaved")).unwrap();
        store.save(&id_key, &snapshot("assigned")).unwrap();

        assert_eq!(store.load(&sentinel).unwrap().unwrap().data, snapshot("unsaved"));
        assert_eq!(store.load(&id_key).unwrap().unwrap().data, snapshot("assigned"));
    }
}
