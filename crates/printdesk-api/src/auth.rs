//! Admin authentication.
//!
//! Single-admin model: a password login
//! issues a short-lived HS256 JWT with `role: "admin"`, and admin handlers
//! require an [`AdminContext`] extractor that verifies the bearer token.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use printdesk_core::{AppError, Config};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::HttpAppError;
use crate::state::AppState;

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Constant-time password check.
pub fn verify_admin_password(config: &Config, candidate: &str) -> bool {
    let expected = config.admin_password.as_bytes();
    let candidate = candidate.as_bytes();
    if expected.len() != candidate.len() {
        return false;
    }
    expected.ct_eq(candidate).into()
}

/// Issue an admin token.
pub fn issue_admin_token(config: &Config) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = AdminClaims {
        role: ADMIN_ROLE.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.jwt_expiry_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Unable to generate token: {}", e)))
}

fn decode_admin_token(config: &Config, token: &str) -> Result<AdminClaims, AppError> {
    let data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    if data.claims.role != ADMIN_ROLE {
        return Err(AppError::Unauthorized("Admin role required".to_string()));
    }
    Ok(data.claims)
}

/// Verified admin identity, extracted from the `Authorization: Bearer` header.
#[derive(Debug)]
pub struct AdminContext {
    pub claims: AdminClaims,
}

impl<S> FromRequestParts<S> for AdminContext
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = Arc::<AppState>::from_ref(state);

        let token = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

        let claims = decode_admin_token(&app.config, token)?;
        Ok(AdminContext { claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> Config {
        Config {
            server_port: 0,
            environment: "test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 1,
            admin_password: "hunter2".to_string(),
            data_file: PathBuf::from("records.json"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 1024,
            cors_origins: vec![],
        }
    }

    #[test]
    fn test_issue_and_decode_roundtrip() {
        let config = config();
        let token = issue_admin_token(&config).unwrap();
        let claims = decode_admin_token(&config, &token).unwrap();
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let config = config();
        let mut other = config.clone();
        other.jwt_secret = "wrong-secret".to_string();
        let token = issue_admin_token(&other).unwrap();
        assert!(matches!(
            decode_admin_token(&config, &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_password_check_is_exact() {
        let config = config();
        assert!(verify_admin_password(&config, "hunter2"));
        assert!(!verify_admin_password(&config, "hunter"));
        assert!(!verify_admin_password(&config, "hunter22"));
        assert!(!verify_admin_password(&config, "HUNTER2"));
    }
}
