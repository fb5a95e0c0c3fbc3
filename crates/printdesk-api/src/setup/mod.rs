//! Application setup and initialization.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use printdesk_core::Config;
use printdesk_storage::LocalBlobStore;
use printdesk_store::FileRecordStore;

use crate::state::AppState;

/// Open the record store and blob store, then wire up the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let store = FileRecordStore::open(&config.data_file)
        .await
        .with_context(|| format!("Failed to open record store at {}", config.data_file.display()))?;

    let storage = LocalBlobStore::new(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to open blob store at {}", config.upload_dir.display()))?;

    tracing::info!(
        data_file = %config.data_file.display(),
        upload_dir = %config.upload_dir.display(),
        "Stores initialized"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        storage: Arc::new(storage),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
