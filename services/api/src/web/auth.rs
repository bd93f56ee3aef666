//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use job_tracker_core::credentials::{normalize_email, validate_registration, CredentialError};
use job_tracker_core::domain::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::security::{self, HashError};
use crate::web::middleware::bearer_token;
use crate::web::response::{
    ErrorBody, HttpError, MSG_BAD_REQUEST, MSG_CREDENTIALS_REQUIRED, MSG_EMAIL_TAKEN,
    MSG_INVALID_EMAIL, MSG_PASSWORD_TOO_SHORT, MSG_UNKNOWN_ACCOUNT, MSG_WRONG_PASSWORD,
};
use crate::web::rest::OkResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Email and password, as sent to both `register` and `login`.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The public view of a user. Password material never leaves the server.
#[derive(Serialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_credentials(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(String, String), HttpError> {
    let Json(req) = payload.map_err(|e| {
        warn!("Rejected credentials payload: {}", e);
        HttpError::bad_request(MSG_BAD_REQUEST)
    })?;

    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(HttpError::bad_request(MSG_CREDENTIALS_REQUIRED));
    }
    Ok((email, password))
}

/// Runs an Argon2 computation off the async executor.
async fn run_blocking<T, F>(task: F) -> Result<T, HttpError>
where
    F: FnOnce() -> Result<T, HashError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {:?}", e);
            HttpError::internal()
        })?
        .map_err(|e| {
            error!("Password hashing failed: {:?}", e);
            HttpError::internal()
        })
}

/// Issues a fresh token for the user, invalidating any previous session.
async fn open_session(state: &AppState, user: User) -> Result<AuthResponse, HttpError> {
    let token = security::generate_token();
    state.db.replace_auth_session(&token, user.id).await?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created and logged in", body = AuthResponse),
        (status = 400, description = "Invalid email or password too short", body = ErrorBody),
        (status = 409, description = "An account already exists for this email", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Validate the credentials
    let (email, password) = parse_credentials(payload)?;
    validate_registration(&email, &password).map_err(|e| match e {
        CredentialError::InvalidEmail => HttpError::bad_request(MSG_INVALID_EMAIL),
        CredentialError::PasswordTooShort => HttpError::bad_request(MSG_PASSWORD_TOO_SHORT),
    })?;

    // 2. Refuse early when the account already has a password
    if let Some(existing) = state.db.get_user_by_email(&email).await? {
        if existing.password().is_some() {
            return Err(HttpError::conflict(MSG_EMAIL_TAKEN));
        }
    }

    // 3. Hash the password and store the user
    let digest = run_blocking(move || security::hash_password(&password)).await?;
    let user = state
        .db
        .create_user_with_password(&email, &digest.hash, &digest.salt)
        .await?;
    info!(user_id = %user.id, "User registered");

    // 4. Log the new user in
    let response = open_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "No account for this email", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let (email, password) = parse_credentials(payload)?;

    // 1. Get user by email
    let creds = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| HttpError::not_found(MSG_UNKNOWN_ACCOUNT))?;

    // 2. Verify password
    let (hash, salt) = creds
        .password()
        .map(|(hash, salt)| (hash.to_string(), salt.to_string()))
        .ok_or_else(|| HttpError::unauthorized(MSG_WRONG_PASSWORD))?;
    let valid = run_blocking(move || security::verify_password(&password, &hash, &salt)).await?;
    if !valid {
        warn!(user_id = %creds.user.id, "Login rejected: wrong password");
        return Err(HttpError::unauthorized(MSG_WRONG_PASSWORD));
    }

    // 3. Replace the previous session
    let response = open_session(&state, creds.user).await?;
    info!(user_id = %response.user.id, "User logged in");
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/auth/logout - Invalidate the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out (also when no session was active)", body = OkResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(token) = bearer_token(&headers) {
        state.db.delete_auth_session(token).await?;
    }
    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: Option<&str>, password: Option<&str>) -> Result<Json<CredentialsRequest>, JsonRejection> {
        Ok(Json(CredentialsRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }))
    }

    #[test]
    fn credentials_are_normalized() {
        let (email, password) =
            parse_credentials(payload(Some(" Alice@Example.com "), Some(" secret pw"))).unwrap();
        assert_eq!(email, "alice@example.com");
        assert_eq!(password, " secret pw");
    }

    #[test]
    fn missing_fields_are_bad_requests() {
        for (email, password) in [(None, Some("password1")), (Some("a@b.c"), None), (Some("  "), Some("x"))] {
            let err = parse_credentials(payload(email, password)).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }
}
