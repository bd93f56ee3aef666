//! services/api/src/web/response.rs
//!
//! The request-level error type. Every failure is rendered as a status code
//! plus a `{ "error": "..." }` body carrying a user-facing French message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use job_tracker_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

pub const MSG_BAD_REQUEST: &str = "Requête invalide.";
pub const MSG_INVALID_EMAIL: &str = "Adresse email invalide.";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Le mot de passe doit contenir au moins 8 caractères.";
pub const MSG_CREDENTIALS_REQUIRED: &str = "Email et mot de passe requis.";
pub const MSG_EMAIL_TAKEN: &str = "Un compte existe déjà avec cet email.";
pub const MSG_UNKNOWN_ACCOUNT: &str = "Aucun compte ne correspond à cet email.";
pub const MSG_WRONG_PASSWORD: &str = "Mot de passe incorrect.";
pub const MSG_UNAUTHENTICATED: &str = "Session invalide ou expirée. Veuillez vous reconnecter.";
pub const MSG_CONTACTS_NOT_ARRAY: &str = "Le champ « contacts » doit être une liste.";
pub const MSG_NOT_FOUND: &str = "Ressource introuvable.";
pub const MSG_SERVER_ERROR: &str = "Erreur interne du serveur.";

/// JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<PortError> for HttpError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::Conflict(_) => Self::conflict(MSG_EMAIL_TAKEN),
            PortError::NotFound(detail) => {
                error!("Storage lookup failed: {}", detail);
                Self::not_found(MSG_NOT_FOUND)
            }
            PortError::Unexpected(detail) => {
                error!("Storage error: {}", detail);
                Self::internal()
            }
        }
    }
}
