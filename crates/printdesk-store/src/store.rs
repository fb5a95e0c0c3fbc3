use std::path::{Path, PathBuf};

use printdesk_core::lifecycle::{self, TransitionError};
use printdesk_core::models::FileRecord;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Record store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// The durable write failed. The in-flight mutation was rolled back;
    /// memory and disk both hold the last successfully persisted state, and
    /// the caller must retry the whole operation.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Creation-time fields for a record; everything else is derived.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub original_name: String,
    pub storage_key: String,
    pub size_bytes: u64,
    pub customer_name: Option<String>,
    pub purpose: Option<String>,
}

/// On-disk layout of the durable collection.
#[derive(Serialize, Deserialize, Default)]
struct Collection {
    files: Vec<FileRecord>,
}

#[derive(Serialize)]
struct CollectionRef<'a> {
    files: &'a [FileRecord],
}

/// Serialized access to the record collection.
///
/// A single whole-store lock covers both the in-memory index and the durable
/// write; expected record counts are small, and every operation is a short,
/// bounded critical section (blob I/O happens outside, in the callers).
#[derive(Debug)]
pub struct FileRecordStore {
    data_path: PathBuf,
    records: Mutex<Vec<FileRecord>>,
}

impl FileRecordStore {
    /// Open the store at `data_path`, loading the existing collection or
    /// starting (and persisting) an empty one. The parent directory is
    /// created if needed.
    pub async fn open(data_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_path = data_path.into();

        if let Some(parent) = data_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Persistence(e.to_string()))?;
            }
        }

        let records = match fs::read(&data_path).await {
            Ok(raw) => {
                let collection: Collection = serde_json::from_slice(&raw).map_err(|e| {
                    StoreError::Persistence(format!(
                        "corrupt record collection {}: {}",
                        data_path.display(),
                        e
                    ))
                })?;
                collection.files
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::Persistence(e.to_string())),
        };

        tracing::info!(
            path = %data_path.display(),
            records = records.len(),
            "Opened file record store"
        );

        let store = Self {
            data_path,
            records: Mutex::new(records),
        };

        // Fail at startup, not on the first upload, if the path is unwritable.
        {
            let records = store.records.lock().await;
            persist(&store.data_path, &records).await?;
        }

        Ok(store)
    }

    /// Append a fresh record and persist. The assigned id never collides
    /// with any id previously issued by this store.
    pub async fn create(&self, new: NewFileRecord) -> StoreResult<FileRecord> {
        let mut records = self.records.lock().await;

        let mut id = Uuid::new_v4();
        while records.iter().any(|r| r.id == id) {
            id = Uuid::new_v4();
        }

        let record = FileRecord::new(
            id,
            new.original_name,
            new.storage_key,
            new.size_bytes,
            new.customer_name,
            new.purpose,
        );

        records.push(record.clone());
        if let Err(e) = persist(&self.data_path, &records).await {
            records.pop();
            return Err(e);
        }

        tracing::info!(id = %record.id, name = %record.original_name, "File record created");
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<FileRecord> {
        let records = self.records.lock().await;
        records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Snapshot of all records in insertion order.
    pub async fn list(&self) -> Vec<FileRecord> {
        self.records.lock().await.clone()
    }

    /// Apply `transform` to the record under exclusive access, validate the
    /// result against the lifecycle invariants, persist, and return the new
    /// value. An invalid result is rejected without persisting anything; a
    /// failed durable write rolls the record back.
    pub async fn mutate<F>(&self, id: Uuid, transform: F) -> StoreResult<FileRecord>
    where
        F: FnOnce(&mut FileRecord) -> Result<(), TransitionError>,
    {
        let mut records = self.records.lock().await;
        let idx = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let before = records[idx].clone();
        let mut after = before.clone();
        transform(&mut after)?;
        lifecycle::validate(&before, &after)?;

        records[idx] = after.clone();
        if let Err(e) = persist(&self.data_path, &records).await {
            records[idx] = before;
            return Err(e);
        }

        Ok(after)
    }

    /// Remove the record and persist; returns the removed record so the
    /// caller can delete its blob. The record is durably gone before this
    /// returns.
    pub async fn delete(&self, id: Uuid) -> StoreResult<FileRecord> {
        let mut records = self.records.lock().await;
        let idx = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let removed = records.remove(idx);
        if let Err(e) = persist(&self.data_path, &records).await {
            records.insert(idx, removed);
            return Err(e);
        }

        tracing::info!(id = %removed.id, name = %removed.original_name, "File record deleted");
        Ok(removed)
    }
}

/// Durably replace the collection: write a temp file, fsync, rename over the
/// live document.
async fn persist(data_path: &Path, records: &[FileRecord]) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(&CollectionRef { files: records })
        .map_err(|e| StoreError::Persistence(e.to_string()))?;

    let tmp_path = data_path.with_extension("json.tmp");

    let mut tmp = fs::File::create(&tmp_path)
        .await
        .map_err(|e| StoreError::Persistence(e.to_string()))?;
    tmp.write_all(&json)
        .await
        .map_err(|e| StoreError::Persistence(e.to_string()))?;
    tmp.sync_all()
        .await
        .map_err(|e| StoreError::Persistence(e.to_string()))?;
    drop(tmp);

    fs::rename(&tmp_path, data_path)
        .await
        .map_err(|e| StoreError::Persistence(e.to_string()))?;

    tracing::debug!(records = records.len(), "Persisted record collection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use printdesk_core::models::{FileStatus, PaymentStatus};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn new_record(name: &str) -> NewFileRecord {
        NewFileRecord {
            original_name: name.to_string(),
            storage_key: format!("{}.blob", name),
            size_bytes: 1000,
            customer_name: None,
            purpose: None,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn open_store(dir: &tempfile::TempDir) -> FileRecordStore {
        FileRecordStore::open(dir.path().join("records.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_get_list_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let a = store.create(new_record("a.stl")).await.unwrap();
        let b = store.create(new_record("b.stl")).await.unwrap();
        assert_ne!(a.id, b.id);

        assert_eq!(store.get(a.id).await.unwrap(), a);
        let listed = store.list().await;
        assert_eq!(listed, vec![a, b]);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let id = Uuid::new_v4();
        assert!(matches!(
            store.get(id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let created = {
            let store = FileRecordStore::open(&path).await.unwrap();
            let r = store.create(new_record("kept.stl")).await.unwrap();
            store
                .mutate(r.id, |rec| lifecycle::set_price(rec, dec("4.20")))
                .await
                .unwrap()
        };

        let reopened = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.list().await, vec![created]);
    }

    #[tokio::test]
    async fn test_mutate_set_price_forces_approval() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let r = store.create(new_record("part.stl")).await.unwrap();

        let updated = store
            .mutate(r.id, |rec| lifecycle::set_price(rec, dec("12.50")))
            .await
            .unwrap();
        assert_eq!(updated.price, Some(dec("12.50")));
        assert_eq!(updated.status, FileStatus::Approved);
    }

    #[tokio::test]
    async fn test_invalid_transform_rejected_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileRecordStore::open(&path).await.unwrap();
        let r = store.create(new_record("part.stl")).await.unwrap();

        let err = store
            .mutate(r.id, |rec| lifecycle::set_price(rec, dec("-9.99")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));

        // Neither memory nor disk observed the rejected mutation.
        assert_eq!(store.get(r.id).await.unwrap(), r);
        let reopened = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(r.id).await.unwrap(), r);
    }

    #[tokio::test]
    async fn test_transform_cannot_touch_immutable_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let r = store.create(new_record("part.stl")).await.unwrap();

        let err = store
            .mutate(r.id, |rec| {
                rec.storage_key = "elsewhere.blob".to_string();
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition(TransitionError::ImmutableFieldChanged(_))
        ));
        assert_eq!(store.get(r.id).await.unwrap().storage_key, r.storage_key);
    }

    #[tokio::test]
    async fn test_concurrent_download_increments_are_all_reflected() {
        const N: usize = 32;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(&dir).await);
        let r = store.create(new_record("busy.stl")).await.unwrap();

        let tasks: Vec<_> = (0..N)
            .map(|_| {
                let store = store.clone();
                let id = r.id;
                tokio::spawn(async move {
                    store
                        .mutate(id, |rec| {
                            lifecycle::record_download(rec);
                            Ok(())
                        })
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get(r.id).await.unwrap().download_count, N as u64);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_on_different_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(&dir).await);
        let a = store.create(new_record("a.stl")).await.unwrap();
        let b = store.create(new_record("b.stl")).await.unwrap();

        let (ra, rb) = tokio::join!(
            store.mutate(a.id, |rec| lifecycle::set_price(rec, dec("1.00"))),
            store.mutate(b.id, |rec| {
                lifecycle::set_payment(rec, PaymentStatus::PaidCash);
                Ok(())
            })
        );
        assert_eq!(ra.unwrap().price, Some(dec("1.00")));
        assert_eq!(rb.unwrap().payment_status, PaymentStatus::PaidCash);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_returns_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileRecordStore::open(&path).await.unwrap();

        let keep = store.create(new_record("keep.stl")).await.unwrap();
        let gone = store.create(new_record("gone.stl")).await.unwrap();

        let removed = store.delete(gone.id).await.unwrap();
        assert_eq!(removed.storage_key, gone.storage_key);
        assert!(matches!(
            store.get(gone.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.list().await, vec![keep.clone()]);

        // Double delete reports NotFound.
        assert!(matches!(
            store.delete(gone.id).await,
            Err(StoreError::NotFound(_))
        ));

        // Deletion is durable.
        let reopened = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.list().await, vec![keep]);
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = FileRecordStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }
}
