//! services/api/src/adapters/db.rs
//!
//! This module contains the PostgreSQL adapter, one concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all
//! interactions with the relational database using `sqlx`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use job_tracker_core::contacts::sort_contacts;
use job_tracker_core::domain::{AuthSession, Contact, User, UserCredentials};
use job_tracker_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::DatabaseSsl;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool with the requested TLS mode.
    pub async fn connect(
        database_url: &str,
        ssl: DatabaseSsl,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let ssl_mode = match ssl {
            DatabaseSsl::Disable => PgSslMode::Disable,
            DatabaseSsl::Prefer => PgSslMode::Prefer,
            DatabaseSsl::Require => PgSslMode::Require,
        };
        let options = PgConnectOptions::from_str(database_url)?.ssl_mode(ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

// Inserting a row for a user that does not exist trips the foreign key.
fn missing_user(e: sqlx::Error, user_id: Uuid) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound(format!("User {} not found", user_id))
        }
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    password_salt: Option<String>,
    created_at: DateTime<Utc>,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
            password_salt: self.password_salt,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            token: self.token,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ContactRecord {
    id: String,
    name: String,
    organisation: String,
    call_date: NaiveDate,
    call_time: String,
    expertise: String,
    inclusivity: String,
    notes: String,
    updated_at: DateTime<Utc>,
}
impl ContactRecord {
    fn to_domain(self) -> Contact {
        Contact {
            id: self.id,
            name: self.name,
            organisation: self.organisation,
            call_date: self.call_date,
            call_time: self.call_time,
            expertise: self.expertise,
            inclusivity: self.inclusivity,
            notes: self.notes,
            updated_at: self.updated_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash, password_salt, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(CredentialsRecord::to_domain))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> PortResult<User> {
        // A password-less row is claimed; a row with a password returns nothing.
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, password_hash, password_salt)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
                 SET password_hash = EXCLUDED.password_hash,
                     password_salt = EXCLUDED.password_salt,
                     updated_at = NOW()
                 WHERE users.password_hash IS NULL OR users.password_hash = ''
             RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(password_salt)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record
            .map(UserRecord::to_domain)
            .ok_or_else(|| PortError::Conflict(format!("User {} already exists", email)))
    }

    async fn replace_auth_session(&self, token: &str, user_id: Uuid) -> PortResult<AuthSession> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO sessions (token, user_id) VALUES ($1, $2) RETURNING token, user_id, created_at",
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_user(e, user_id))?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.email, u.created_at
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(UserRecord::to_domain))
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_contacts_for_user(&self, user_id: Uuid) -> PortResult<Vec<Contact>> {
        let records = sqlx::query_as::<_, ContactRecord>(
            "SELECT id, name, organisation, call_date, call_time, expertise, inclusivity, notes, updated_at
             FROM contacts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        // Sorted here rather than in SQL so the order does not depend on the
        // database collation.
        let mut contacts: Vec<Contact> = records.into_iter().map(ContactRecord::to_domain).collect();
        sort_contacts(&mut contacts);
        Ok(contacts)
    }

    async fn replace_contacts_for_user(
        &self,
        user_id: Uuid,
        contacts: &[Contact],
    ) -> PortResult<usize> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM contacts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        for contact in contacts {
            sqlx::query(
                "INSERT INTO contacts
                     (id, user_id, name, organisation, call_date, call_time, expertise, inclusivity, notes, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&contact.id)
            .bind(user_id)
            .bind(&contact.name)
            .bind(&contact.organisation)
            .bind(contact.call_date)
            .bind(&contact.call_time)
            .bind(&contact.expertise)
            .bind(&contact.inclusivity)
            .bind(&contact.notes)
            .bind(contact.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| missing_user(e, user_id))?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(contacts.len())
    }
}
