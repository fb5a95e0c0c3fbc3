//! Application state shared by all handlers.

use std::sync::Arc;

use printdesk_core::Config;
use printdesk_storage::BlobStorage;
use printdesk_store::FileRecordStore;

pub struct AppState {
    pub config: Config,
    pub store: FileRecordStore,
    pub storage: Arc<dyn BlobStorage>,
}
