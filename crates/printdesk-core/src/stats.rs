//! Summary statistics over the record collection.
//!
//! Always recomputed from a live snapshot in a single pass; record counts are
//! small and correctness matters more than throughput here, so nothing is
//! cached.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{FileRecord, FileStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_files: u64,
    pub pending_files: u64,
    pub approved_files: u64,
    pub total_downloads: u64,
    pub total_size_bytes: u64,
}

/// Aggregate the snapshot into summary counts and sizes.
pub fn aggregate(records: &[FileRecord]) -> LibraryStats {
    records.iter().fold(LibraryStats::default(), |mut acc, r| {
        acc.total_files += 1;
        match r.status {
            FileStatus::Pending => acc.pending_files += 1,
            FileStatus::Approved => acc.approved_files += 1,
        }
        acc.total_downloads += r.download_count;
        acc.total_size_bytes += r.size_bytes;
        acc
    })
}
