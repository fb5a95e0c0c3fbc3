//! Storage abstraction trait
//!
//! This module defines the BlobStorage trait that all storage backends must
//! implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Payload exceeds the {limit} byte ceiling")]
    PayloadTooLarge { limit: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream handed to download responses.
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// A successfully stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBlob {
    /// Key unique among all currently live blobs.
    pub storage_key: String,
    /// Actual payload size counted during the streaming write.
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// The record layer works against this trait and never touches paths
/// directly. All operations are keyed by the opaque storage key returned
/// from [`BlobStorage::write`].
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stream a payload into storage, enforcing `size_limit` as it is
    /// consumed. A stream exceeding the limit is rejected with
    /// [`StorageError::PayloadTooLarge`] and leaves no partial blob behind.
    ///
    /// The reader may borrow from the caller (e.g. an in-flight multipart
    /// field); it only has to live for the duration of the call.
    async fn write<'a>(
        &self,
        original_name: &str,
        size_limit: u64,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin + 'a>>,
    ) -> StorageResult<WrittenBlob>;

    /// Check if a blob exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Open a blob for streaming reads
    async fn open_for_read(&self, storage_key: &str) -> StorageResult<BlobStream>;

    /// Delete a blob; missing keys report [`StorageError::NotFound`]
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;
}
