//! Durable file record store.
//!
//! One record per uploaded file, held in a mutex-guarded in-memory index and
//! persisted as a single JSON document after every mutation. The durable
//! write happens inside the same critical section as the in-memory update,
//! so a reader can never observe an unpersisted state and concurrent
//! read-modify-write sequences serialize cleanly.

mod store;

pub use store::{FileRecordStore, NewFileRecord, StoreError, StoreResult};
