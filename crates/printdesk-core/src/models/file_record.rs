use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Approval state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Approved,
}

/// Whether the file's price has been collected. Independent of [`FileStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    Unpaid,
    PaidCash,
}

/// Metadata entry describing one uploaded file.
///
/// `id`, `original_name`, `storage_key`, `size_bytes`, `uploaded_at`,
/// `customer_name` and `purpose` are immutable after creation; the remaining
/// fields only change through the lifecycle functions in [`crate::lifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    /// User-supplied display name, used for download responses.
    pub original_name: String,
    /// Opaque reference into the blob store.
    pub storage_key: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub status: FileStatus,
    /// Unset until an admin prices the file; once set it may be updated but
    /// never cleared.
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub payment_status: PaymentStatus,
    pub download_count: u64,
}

impl FileRecord {
    /// Build a freshly uploaded record: pending, unpriced, unpaid, never
    /// downloaded.
    pub fn new(
        id: Uuid,
        original_name: String,
        storage_key: String,
        size_bytes: u64,
        customer_name: Option<String>,
        purpose: Option<String>,
    ) -> Self {
        Self {
            id,
            original_name,
            storage_key,
            size_bytes,
            uploaded_at: Utc::now(),
            customer_name,
            purpose,
            status: FileStatus::Pending,
            price: None,
            payment_status: PaymentStatus::Unpaid,
            download_count: 0,
        }
    }
}
