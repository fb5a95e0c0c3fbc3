//! Printdesk HTTP API.
//!
//! Anonymous users upload files for physical production, an administrator
//! reviews, prices, and approves them, and anyone can then download approved
//! files. The heavy lifting lives in `printdesk-store` (record collection)
//! and `printdesk-storage` (blobs); this crate is the axum surface over them.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
