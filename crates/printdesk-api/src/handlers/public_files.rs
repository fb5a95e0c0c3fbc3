use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use printdesk_core::models::FileRecord;
use printdesk_core::{lifecycle, AppError};
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Public listing: approved, priced files only. Pending or unpriced records
/// are never exposed here.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Approved files with prices", body = [FileRecord])
    )
)]
pub async fn list_public_files(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<FileRecord>> {
    let files: Vec<FileRecord> = state
        .store
        .list()
        .await
        .into_iter()
        .filter(lifecycle::is_publicly_listed)
        .collect();
    Json(files)
}

/// Download a file and count it.
///
/// The blob existence check and the counted increment happen before the
/// stream starts, so a record whose blob is missing is a plain 404 and the
/// counter never moves for it. The count is not rolled back if the client
/// aborts mid-stream.
#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File payload", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(file_id = %id, operation = "download_file"))]
pub async fn download_file(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let record = state.store.get(id).await.map_err(HttpAppError::from)?;

    if !state
        .storage
        .exists(&record.storage_key)
        .await
        .map_err(HttpAppError::from)?
    {
        return Err(AppError::NotFound("File not found on disk".to_string()).into());
    }

    let record = state
        .store
        .mutate(id, |r| {
            lifecycle::record_download(r);
            Ok(())
        })
        .await
        .map_err(HttpAppError::from)?;

    let stream = state
        .storage
        .open_for_read(&record.storage_key)
        .await
        .map_err(HttpAppError::from)?;

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, record.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                record.original_name.replace(['"', '\r', '\n'], "_")
            ),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build download response");
            HttpAppError(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
