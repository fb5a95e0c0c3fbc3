use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use printdesk_core::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Admin login: password in, bearer token out.
#[utoipa::path(
    post,
    path = "/api/auth/admin-login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid password", body = ErrorResponse)
    )
)]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !auth::verify_admin_password(&state.config, &request.password) {
        tracing::warn!("Failed admin login attempt");
        return Err(AppError::Unauthorized("Invalid password".to_string()).into());
    }

    let token = auth::issue_admin_token(&state.config)?;
    Ok(Json(LoginResponse { token }))
}
