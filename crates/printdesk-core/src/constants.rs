//! Shared constants.

/// Hard ceiling for a single uploaded payload (500 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Default HTTP port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default lifetime of an admin token.
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Default location of the durable record collection.
pub const DEFAULT_DATA_FILE: &str = "./data/records.json";

/// Default root directory for uploaded blobs.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
