pub mod admin;
pub mod login;
pub mod public_files;
pub mod upload;
