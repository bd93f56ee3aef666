//! services/api/src/web/router.rs
//!
//! Assembles the complete axum application: API routes, the OpenAPI UI and
//! the static file fallback.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{any, get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{login_handler, logout_handler, register_handler},
    middleware::require_auth,
    rest::{api_not_found, health_handler, ApiDoc},
    state::AppState,
    sync::{pull_handler, push_handler},
};

/// Maximum accepted request body.
const BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Builds a CORS layer allowing a single browser origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}

pub fn build_router(state: Arc<AppState>, static_root: &Path, cors: Option<CorsLayer>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/sync", get(pull_handler).put(push_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Combine API routes
    let mut api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/api/{*rest}", any(api_not_found))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES));
    if let Some(cors) = cors {
        api_router = api_router.layer(cors);
    }

    // Everything else is served from the application root. ServeDir refuses
    // paths that escape it.
    Router::new()
        .merge(api_router.with_state(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(ServeDir::new(static_root))
        .layer(TraceLayer::new_for_http())
}
