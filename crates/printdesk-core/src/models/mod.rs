pub mod file_record;

pub use file_record::{FileRecord, FileStatus, PaymentStatus};
