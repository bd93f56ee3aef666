//! crates/job_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Represents a registered user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/register - contains sensitive data.
// A row may exist without a password; registration then claims it.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: Option<String>,
    pub password_salt: Option<String>,
}

impl UserCredentials {
    /// Returns the hash and salt when both are present.
    pub fn password(&self) -> Option<(&str, &str)> {
        match (&self.password_hash, &self.password_salt) {
            (Some(hash), Some(salt)) if !hash.is_empty() => Some((hash.as_str(), salt.as_str())),
            _ => None,
        }
    }
}

// Represents a bearer-token login session. At most one per user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A networking call with an organisation, as stored for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub organisation: String,
    pub call_date: NaiveDate,
    pub call_time: String,
    pub expertise: String,
    pub inclusivity: String,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
}

/// An unvalidated contact as submitted by a client during a sync push.
///
/// Every field is optional; [`crate::contacts::sanitize_contacts`] turns drafts
/// into [`Contact`]s and drops the ones that cannot be stored.
#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub organisation: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub expertise: Option<String>,
    pub inclusivity: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<String>,
}
