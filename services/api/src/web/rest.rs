//! services/api/src/web/rest.rs
//!
//! Contains the small utility endpoints and the master definition for the
//! OpenAPI specification.

use axum::{http::Uri, response::IntoResponse, Json};
use serde::Serialize;
use tracing::debug;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::auth::{self, AuthResponse, CredentialsRequest, UserView};
use crate::web::response::{ErrorBody, HttpError, MSG_NOT_FOUND};
use crate::web::sync::{
    self, ContactPayload, ContactView, SyncPullResponse, SyncPushRequest, SyncPushResponse,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        sync::pull_handler,
        sync::push_handler,
    ),
    components(
        schemas(
            OkResponse,
            ErrorBody,
            CredentialsRequest,
            AuthResponse,
            UserView,
            ContactPayload,
            ContactView,
            SyncPullResponse,
            SyncPushRequest,
            SyncPushResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Contact Tracker API", description = "Account and contact synchronization endpoints.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

/// GET /api/health - Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "The server is up", body = OkResponse)
    )
)]
pub async fn health_handler() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// Any unknown `/api/*` path. Keeps API misses out of the static file fallback.
pub async fn api_not_found(uri: Uri) -> impl IntoResponse {
    debug!("No API route for {}", uri);
    HttpError::not_found(MSG_NOT_FOUND)
}
