//! Printdesk Core Library
//!
//! This crate provides the domain models, lifecycle rules, error types,
//! statistics, and configuration shared by all printdesk components.

pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use lifecycle::TransitionError;
pub use models::{FileRecord, FileStatus, PaymentStatus};
pub use stats::LibraryStats;
