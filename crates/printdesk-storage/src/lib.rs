//! Blob storage for uploaded payloads.
//!
//! Raw file payloads live here, independent of the metadata store. The
//! [`BlobStorage`] trait keeps the record layer decoupled from the backend;
//! [`LocalBlobStore`] is the filesystem implementation.
//!
//! **Key format:** keys are flat, `{uuid}` plus the sanitized extension of
//! the original filename (e.g. `3f6c...-b2.stl`), unique among all live
//! blobs.

mod local;
mod traits;

pub use local::LocalBlobStore;
pub use traits::{BlobStorage, BlobStream, StorageError, StorageResult, WrittenBlob};
