//! Configuration module
//!
//! Environment-driven configuration for the API binary. `.env` files are
//! honored via dotenvy; every setting has a development default except the
//! admin password and the JWT secret, which must be set outside development.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::constants::{
    DEFAULT_DATA_FILE, DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SERVER_PORT,
    DEFAULT_UPLOAD_DIR,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub admin_password: String,
    /// Durable record collection (single JSON document).
    pub data_file: PathBuf,
    /// Root directory for uploaded blobs.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let is_production = environment == "production" || environment == "prod";

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if is_production => bail!("JWT_SECRET must be set in production"),
            Err(_) => "printdesk_dev_secret".to_string(),
        };
        let admin_password = match env::var("ADMIN_PASSWORD") {
            Ok(password) => password,
            Err(_) if is_production => bail!("ADMIN_PASSWORD must be set in production"),
            Err(_) => "admin123".to_string(),
        };

        Ok(Self {
            server_port: parse_env("PORT", DEFAULT_SERVER_PORT)?,
            environment,
            jwt_secret,
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS)?,
            admin_password,
            data_file: PathBuf::from(
                env::var("DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string()),
            ),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string()),
            ),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production" || self.environment == "prod"
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {key}")),
        Err(_) => Ok(default),
    }
}
