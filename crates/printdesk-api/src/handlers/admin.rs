use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use printdesk_core::models::{FileRecord, PaymentStatus};
use printdesk_core::{lifecycle, stats, AppError, LibraryStats};
use printdesk_storage::StorageError;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPriceRequest {
    #[schema(value_type = f64)]
    pub price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPaymentRequest {
    pub payment_status: PaymentStatus,
}

/// All records, pending included, in upload order.
#[utoipa::path(
    get,
    path = "/api/admin/files",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All file records", body = [FileRecord]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_all_files(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<FileRecord>> {
    Json(state.store.list().await)
}

/// Price a file. A non-negative price always approves the record; a
/// negative price is rejected as an invalid transition.
#[utoipa::path(
    put,
    path = "/api/admin/files/{id}/price",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = SetPriceRequest,
    responses(
        (status = 200, description = "Price set, record approved", body = FileRecord),
        (status = 400, description = "Invalid price", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin), fields(file_id = %id, operation = "set_price"))]
pub async fn set_price(
    _admin: AdminContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPriceRequest>,
) -> Result<Json<FileRecord>, HttpAppError> {
    let record = state
        .store
        .mutate(id, |r| lifecycle::set_price(r, request.price))
        .await?;
    tracing::info!(file_id = %id, price = %request.price, "Price set");
    Ok(Json(record))
}

/// Approve a file without pricing it. It stays off the public listing until
/// it also has a price.
#[utoipa::path(
    put,
    path = "/api/admin/files/{id}/approve",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Record approved", body = FileRecord),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn approve_file(
    _admin: AdminContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileRecord>, HttpAppError> {
    let record = state
        .store
        .mutate(id, |r| {
            lifecycle::approve(r);
            Ok(())
        })
        .await?;
    Ok(Json(record))
}

/// Mark how a file was paid. Independent of approval.
#[utoipa::path(
    put,
    path = "/api/admin/files/{id}/payment",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = SetPaymentRequest,
    responses(
        (status = 200, description = "Payment state updated", body = FileRecord),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn set_payment(
    _admin: AdminContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPaymentRequest>,
) -> Result<Json<FileRecord>, HttpAppError> {
    let record = state
        .store
        .mutate(id, |r| {
            lifecycle::set_payment(r, request.payment_status);
            Ok(())
        })
        .await?;
    Ok(Json(record))
}

/// Delete a record and its blob.
///
/// The record is removed first and is durably gone even if the blob removal
/// then fails; that case is reported as a partial failure so operators can
/// reconcile orphaned blobs out of band. A blob that is already absent
/// counts as removed.
#[utoipa::path(
    delete,
    path = "/api/admin/files/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 204, description = "Record and blob deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Record deleted, blob removal failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _admin), fields(file_id = %id, operation = "delete_file"))]
pub async fn delete_file(
    _admin: AdminContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let removed = state.store.delete(id).await?;

    match state.storage.delete(&removed.storage_key).await {
        Ok(()) => {}
        // Nothing left to reconcile; the delete still succeeded in full.
        Err(StorageError::NotFound(_)) => {
            tracing::debug!(
                file_id = %id,
                storage_key = %removed.storage_key,
                "Blob was already absent at delete"
            );
        }
        Err(e) => {
            tracing::warn!(
                file_id = %id,
                storage_key = %removed.storage_key,
                error = %e,
                "Record deleted but blob removal failed"
            );
            return Err(AppError::PartialDelete {
                id,
                storage_key: removed.storage_key,
            }
            .into());
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Summary statistics over the whole collection, recomputed per request.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Collection statistics", body = LibraryStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_stats(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Json<LibraryStats> {
    let snapshot = state.store.list().await;
    Json(stats::aggregate(&snapshot))
}
