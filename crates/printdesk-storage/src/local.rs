use crate::traits::{BlobStorage, BlobStream, StorageError, StorageResult, WrittenBlob};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

const WRITE_CHUNK_BYTES: usize = 64 * 1024;

/// Local filesystem blob store
#[derive(Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore rooted at `base_path` (e.g. "./uploads"),
    /// creating the directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting traversal
    /// sequences that could escape the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(storage_key))
    }

    /// Fresh key: a UUIDv4 plus the sanitized extension of the display name.
    /// The UUID guarantees uniqueness among live blobs; the extension is kept
    /// so downloads keep a recognizable file type.
    fn generate_key(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 16)
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));

        match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        }
    }

    async fn remove_partial(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial blob");
        }
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStore {
    async fn write<'a>(
        &self,
        original_name: &str,
        size_limit: u64,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin + 'a>>,
    ) -> StorageResult<WrittenBlob> {
        let key = Self::generate_key(original_name);
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut written: u64 = 0;
        let mut buf = vec![0u8; WRITE_CHUNK_BYTES];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    self.remove_partial(&path).await;
                    return Err(StorageError::WriteFailed(format!(
                        "Failed to read upload stream: {}",
                        e
                    )));
                }
            };

            written += n as u64;
            if written > size_limit {
                drop(file);
                self.remove_partial(&path).await;
                return Err(StorageError::PayloadTooLarge { limit: size_limit });
            }

            if let Err(e) = file.write_all(&buf[..n]).await {
                drop(file);
                self.remove_partial(&path).await;
                return Err(StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        if let Err(e) = file.sync_all().await {
            drop(file);
            self.remove_partial(&path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to sync file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob write successful"
        );

        Ok(WrittenBlob {
            storage_key: key,
            size_bytes: written,
        })
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn open_for_read(&self, storage_key: &str) -> StorageResult<BlobStream> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let stream = tokio_util::io::ReaderStream::new(file).map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(key = %storage_key, "Blob delete successful");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncRead;

    fn reader(data: Vec<u8>) -> Pin<Box<dyn AsyncRead + Send + Unpin>> {
        Box::pin(std::io::Cursor::new(data))
    }

    async fn collect(mut stream: BlobStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let data = b"solid part".to_vec();
        let blob = store
            .write("part.stl", 1024, reader(data.clone()))
            .await
            .unwrap();

        assert_eq!(blob.size_bytes, data.len() as u64);
        assert!(blob.storage_key.ends_with(".stl"));
        assert!(store.exists(&blob.storage_key).await.unwrap());

        let stream = store.open_for_read(&blob.storage_key).await.unwrap();
        assert_eq!(collect(stream).await, data);
    }

    #[tokio::test]
    async fn test_write_at_exact_limit_succeeds() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let data = vec![7u8; 4096];
        let blob = store.write("cube.stl", 4096, reader(data)).await.unwrap();
        assert_eq!(blob.size_bytes, 4096);
    }

    #[tokio::test]
    async fn test_write_one_byte_over_limit_rejected_without_residue() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let data = vec![7u8; 4097];
        let err = store.write("cube.stl", 4096, reader(data)).await.unwrap_err();
        assert!(matches!(err, StorageError::PayloadTooLarge { limit: 4096 }));

        // The partial file must not be left behind.
        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_are_unique_per_write() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let a = store.write("a.stl", 64, reader(vec![1])).await.unwrap();
        let b = store.write("a.stl", 64, reader(vec![2])).await.unwrap();
        assert_ne!(a.storage_key, b.storage_key);
    }

    #[tokio::test]
    async fn test_key_without_extension() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let blob = store.write("README", 64, reader(vec![1])).await.unwrap();
        assert!(!blob.storage_key.contains('.'));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        for key in ["../escape.stl", "a/b.stl", "..", ""] {
            let result = store.exists(key).await;
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "{key}");
        }
    }

    #[tokio::test]
    async fn test_delete_missing_blob_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let result = store.delete("nonexistent.stl").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_blob() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let blob = store.write("gone.stl", 64, reader(vec![1, 2])).await.unwrap();
        store.delete(&blob.storage_key).await.unwrap();
        assert!(!store.exists(&blob.storage_key).await.unwrap());

        let result = store.open_for_read(&blob.storage_key).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
