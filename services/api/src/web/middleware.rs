//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use job_tracker_core::domain::User;
use std::sync::Arc;

use crate::web::response::{HttpError, MSG_UNAUTHENTICATED};
use crate::web::state::AppState;

/// The user resolved from the bearer token, available to protected handlers.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that validates the bearer token and resolves its user.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers to use.
/// A missing or unknown token is answered with 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| HttpError::unauthorized(MSG_UNAUTHENTICATED))?
        .to_string();

    let user = state
        .db
        .validate_auth_session(&token)
        .await?
        .ok_or_else(|| HttpError::unauthorized(MSG_UNAUTHENTICATED))?;

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer   abc123 ")), Some("abc123"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc123")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
