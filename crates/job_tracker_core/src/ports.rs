//! crates/job_tracker_core/src/ports.rs
//!
//! Defines the storage contract for the application's core logic.
//! The HTTP layer only talks to [`DatabaseService`], so the flat-file and
//! relational backends are interchangeable.

use crate::domain::{AuthSession, Contact, User, UserCredentials};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the storage backends.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---

    /// Looks up a user by normalized email. `None` when no row exists.
    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    /// Creates a user, or sets the password of an existing password-less row.
    ///
    /// Fails with [`PortError::Conflict`] when the email already has a password.
    async fn create_user_with_password(
        &self,
        email: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> PortResult<User>;

    // --- Auth Sessions ---

    /// Stores `token` as the only session of `user_id`, dropping any previous one.
    async fn replace_auth_session(&self, token: &str, user_id: Uuid) -> PortResult<AuthSession>;

    /// Resolves a token to its live user. Unknown tokens yield `None`.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Option<User>>;

    /// Deletes the session if it exists.
    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Contacts ---

    /// Returns every contact of the user, newest call first.
    async fn get_contacts_for_user(&self, user_id: Uuid) -> PortResult<Vec<Contact>>;

    /// Atomically replaces the user's whole contact set. Returns the stored count.
    async fn replace_contacts_for_user(
        &self,
        user_id: Uuid,
        contacts: &[Contact],
    ) -> PortResult<usize>;
}
