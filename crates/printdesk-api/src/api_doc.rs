//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use printdesk_core::models;
use printdesk_core::stats;

/// Registers the bearer token scheme referenced by the admin endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Printdesk API",
        version = "0.1.0",
        description = "File drop-off service for a 3D print desk. Customers upload model files, an administrator reviews, prices, and approves them, and approved files become publicly listable and downloadable."
    ),
    paths(
        // Auth
        handlers::login::admin_login,
        // Public files
        handlers::upload::upload_file,
        handlers::public_files::list_public_files,
        handlers::public_files::download_file,
        // Admin
        handlers::admin::list_all_files,
        handlers::admin::set_price,
        handlers::admin::approve_file,
        handlers::admin::set_payment,
        handlers::admin::delete_file,
        handlers::admin::get_stats,
    ),
    components(
        schemas(
            models::FileRecord,
            models::FileStatus,
            models::PaymentStatus,
            stats::LibraryStats,
            handlers::login::LoginRequest,
            handlers::login::LoginResponse,
            handlers::admin::SetPriceRequest,
            handlers::admin::SetPaymentRequest,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Administrator authentication"),
        (name = "files", description = "Public upload, listing, and download operations"),
        (name = "admin", description = "Review, pricing, payment, and deletion operations")
    )
)]
pub struct ApiDoc;
