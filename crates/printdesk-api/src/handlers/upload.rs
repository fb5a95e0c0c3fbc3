use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use printdesk_core::models::FileRecord;
use printdesk_core::AppError;
use printdesk_storage::WrittenBlob;
use printdesk_store::NewFileRecord;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Upload a file for production.
///
/// The payload is streamed into the blob store first, under the configured
/// size ceiling; the record is only created (pending, unpriced) once the
/// blob write has completed, so a half-written upload is never visible.
/// Any failure after the blob write removes the orphaned blob again.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = FileRecord),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut customer_name: Option<String> = None;
    let mut purpose: Option<String> = None;
    let mut written: Option<(WrittenBlob, String)> = None;

    // Walk the whole form inside one fallible block so every failure after
    // the blob write funnels through the same cleanup below.
    let consumed: Result<(), HttpAppError> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
        {
            match field.name() {
                Some("customer_name") => {
                    customer_name = read_text_field(field).await?;
                }
                Some("purpose") => {
                    purpose = read_text_field(field).await?;
                }
                Some("file") => {
                    if written.is_some() {
                        return Err(AppError::InvalidInput(
                            "Only one file per upload".to_string(),
                        )
                        .into());
                    }

                    let original_name = field
                        .file_name()
                        .map(str::to_string)
                        .filter(|name| !name.is_empty())
                        .ok_or_else(|| {
                            AppError::InvalidInput("File field is missing a filename".to_string())
                        })?;

                    let reader: Pin<Box<dyn AsyncRead + Send + Unpin + '_>> =
                        Box::pin(StreamReader::new(field.map_err(std::io::Error::other)));
                    let blob = state
                        .storage
                        .write(&original_name, state.config.max_upload_bytes, reader)
                        .await
                        .map_err(HttpAppError::from)?;

                    written = Some((blob, original_name));
                }
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = consumed {
        if let Some((blob, _)) = written {
            remove_orphaned_blob(&state, &blob.storage_key).await;
        }
        return Err(e);
    }

    let (blob, original_name) = written
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    match state
        .store
        .create(NewFileRecord {
            original_name,
            storage_key: blob.storage_key.clone(),
            size_bytes: blob.size_bytes,
            customer_name,
            purpose,
        })
        .await
    {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => {
            // The record never existed; remove the now-orphaned blob.
            remove_orphaned_blob(&state, &blob.storage_key).await;
            Err(e.into())
        }
    }
}

async fn remove_orphaned_blob(state: &AppState, storage_key: &str) {
    if let Err(e) = state.storage.delete(storage_key).await {
        tracing::warn!(
            error = %e,
            storage_key = %storage_key,
            "Failed to clean up orphaned blob"
        );
    }
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<String>, HttpAppError> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid form field: {}", e)))?;
    let text = text.trim().to_string();
    Ok(if text.is_empty() { None } else { Some(text) })
}
