//! Route configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use printdesk_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Wire all routes and middleware onto a router.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Server-level concurrency cap to protect against resource exhaustion
    // under extreme load.
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1024)
        .max(1);

    // The blob store enforces the upload ceiling while streaming, so the
    // framework body limit is lifted on the upload route; an oversized
    // payload is cut off at max_upload_bytes rather than buffered.
    let upload_routes = Router::new()
        .route("/api/files/upload", post(handlers::upload::upload_file))
        .layer(DefaultBodyLimit::disable());

    let public_routes = Router::new()
        .route("/api/auth/admin-login", post(handlers::login::admin_login))
        .route("/api/files", get(handlers::public_files::list_public_files))
        .route(
            "/api/files/download/{id}",
            get(handlers::public_files::download_file),
        );

    let admin_routes = Router::new()
        .route("/api/admin/files", get(handlers::admin::list_all_files))
        .route("/api/admin/files/{id}/price", put(handlers::admin::set_price))
        .route(
            "/api/admin/files/{id}/approve",
            put(handlers::admin::approve_file),
        )
        .route(
            "/api/admin/files/{id}/payment",
            put(handlers::admin::set_payment),
        )
        .route("/api/admin/files/{id}", delete(handlers::admin::delete_file))
        .route("/api/admin/stats", get(handlers::admin::get_stats));

    let app = Router::new()
        .merge(upload_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .route("/health", get(health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(RapiDoc::new("/api/openapi.json").path("/rapidoc"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins.is_empty() || config.cors_origins.contains(&"*".to_string()) {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins in production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };

    Ok(cors)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
