//! services/api/src/adapters/file.rs
//!
//! A flat-file implementation of the `DatabaseService` port for single-host
//! deployments without PostgreSQL.
//!
//! The whole database is one JSON document:
//!
//! ```text
//! { "users": [...], "sessions": [...], "contacts": [...] }
//! ```
//!
//! It is loaded once at startup and kept in memory behind an async mutex.
//! Every mutation is applied to a copy, written to a temporary sibling file,
//! renamed over the original and only then published in memory, so a failed
//! write leaves both the file and the in-memory state untouched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use job_tracker_core::contacts::sort_contacts;
use job_tracker_core::domain::{AuthSession, Contact, User, UserCredentials};
use job_tracker_core::ports::{DatabaseService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// On-disk Document
//=========================================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct FileDatabase {
    #[serde(default)]
    users: Vec<StoredUser>,
    #[serde(default)]
    sessions: Vec<StoredSession>,
    #[serde(default)]
    contacts: Vec<StoredContact>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: Uuid,
    email: String,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    password_salt: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredUser {
    fn to_domain(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }

    fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredContact {
    id: String,
    user_id: Uuid,
    name: String,
    organisation: String,
    call_date: NaiveDate,
    #[serde(default)]
    call_time: String,
    #[serde(default)]
    expertise: String,
    #[serde(default)]
    inclusivity: String,
    #[serde(default)]
    notes: String,
    updated_at: DateTime<Utc>,
}

impl StoredContact {
    fn from_domain(user_id: Uuid, contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            user_id,
            name: contact.name.clone(),
            organisation: contact.organisation.clone(),
            call_date: contact.call_date,
            call_time: contact.call_time.clone(),
            expertise: contact.expertise.clone(),
            inclusivity: contact.inclusivity.clone(),
            notes: contact.notes.clone(),
            updated_at: contact.updated_at,
        }
    }

    fn to_domain(&self) -> Contact {
        Contact {
            id: self.id.clone(),
            name: self.name.clone(),
            organisation: self.organisation.clone(),
            call_date: self.call_date,
            call_time: self.call_time.clone(),
            expertise: self.expertise.clone(),
            inclusivity: self.inclusivity.clone(),
            notes: self.notes.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl FileDatabase {
    fn user(&self, user_id: Uuid) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id == user_id)
    }

    fn require_user(&self, user_id: Uuid) -> PortResult<()> {
        self.user(user_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A JSON-file adapter that implements the `DatabaseService` port.
pub struct FileAdapter {
    path: PathBuf,
    state: Mutex<FileDatabase>,
}

impl FileAdapter {
    /// Opens the database file, starting empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> PortResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PortError::Unexpected(format!("Corrupt data file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileDatabase::default(),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sibling file a write goes through: the full file name plus `.tmp`,
    /// so it never collides with the data file itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, db: &FileDatabase) -> PortResult<()> {
        let bytes = serde_json::to_vec_pretty(db).map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PortError::Unexpected(e.to_string()));
        }
        debug!("Wrote data file {}", self.path.display());
        Ok(())
    }

    /// Applies `change` to a copy of the database, persists it, then publishes it.
    async fn mutate<T, F>(&self, change: F) -> PortResult<T>
    where
        F: FnOnce(&mut FileDatabase) -> PortResult<T> + Send,
        T: Send,
    {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for FileAdapter {
    async fn get_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let db = self.state.lock().await;
        Ok(db.users.iter().find(|u| u.email == email).map(|u| UserCredentials {
            user: u.to_domain(),
            password_hash: u.password_hash.clone(),
            password_salt: u.password_salt.clone(),
        }))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> PortResult<User> {
        self.mutate(|db| {
            let now = Utc::now();
            match db.users.iter_mut().find(|u| u.email == email) {
                Some(existing) if existing.has_password() => {
                    Err(PortError::Conflict(format!("User {} already exists", email)))
                }
                Some(existing) => {
                    existing.password_hash = Some(password_hash.to_string());
                    existing.password_salt = Some(password_salt.to_string());
                    existing.updated_at = now;
                    Ok(existing.to_domain())
                }
                None => {
                    let user = StoredUser {
                        id: Uuid::new_v4(),
                        email: email.to_string(),
                        password_hash: Some(password_hash.to_string()),
                        password_salt: Some(password_salt.to_string()),
                        created_at: now,
                        updated_at: now,
                    };
                    let domain = user.to_domain();
                    db.users.push(user);
                    Ok(domain)
                }
            }
        })
        .await
    }

    async fn replace_auth_session(&self, token: &str, user_id: Uuid) -> PortResult<AuthSession> {
        self.mutate(|db| {
            db.require_user(user_id)?;
            db.sessions.retain(|s| s.user_id != user_id);
            let session = StoredSession {
                token: token.to_string(),
                user_id,
                created_at: Utc::now(),
            };
            db.sessions.push(session.clone());
            Ok(AuthSession {
                token: session.token,
                user_id: session.user_id,
                created_at: session.created_at,
            })
        })
        .await
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Option<User>> {
        let db = self.state.lock().await;
        Ok(db
            .sessions
            .iter()
            .find(|s| s.token == token)
            .and_then(|s| db.user(s.user_id))
            .map(StoredUser::to_domain))
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        {
            let db = self.state.lock().await;
            if !db.sessions.iter().any(|s| s.token == token) {
                return Ok(());
            }
        }
        self.mutate(|db| {
            db.sessions.retain(|s| s.token != token);
            Ok(())
        })
        .await
    }

    async fn get_contacts_for_user(&self, user_id: Uuid) -> PortResult<Vec<Contact>> {
        let db = self.state.lock().await;
        let mut contacts: Vec<Contact> = db
            .contacts
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(StoredContact::to_domain)
            .collect();
        sort_contacts(&mut contacts);
        Ok(contacts)
    }

    async fn replace_contacts_for_user(
        &self,
        user_id: Uuid,
        contacts: &[Contact],
    ) -> PortResult<usize> {
        self.mutate(|db| {
            db.require_user(user_id)?;
            db.contacts.retain(|c| c.user_id != user_id);
            db.contacts
                .extend(contacts.iter().map(|c| StoredContact::from_domain(user_id, c)));
            Ok(contacts.len())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, FileAdapter) {
        let tmp = TempDir::new().unwrap();
        let store = FileAdapter::open(tmp.path().join("data").join("db.json"))
            .await
            .unwrap();
        (tmp, store)
    }

    fn contact(id: &str, name: &str, date: (i32, u32, u32)) -> Contact {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            organisation: "Acme".to_string(),
            call_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            call_time: String::new(),
            expertise: String::new(),
            inclusivity: String::new(),
            notes: String::new(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn data_file_with_tmp_extension_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.tmp");
        let store = FileAdapter::open(&path).await.unwrap();
        assert_eq!(store.temp_path(), tmp.path().join("db.tmp.tmp"));

        store
            .create_user_with_password("a@b.c", "aa", "bb")
            .await
            .unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let reopened = FileAdapter::open(&path).await.unwrap();
        assert!(reopened.get_user_by_email("a@b.c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file_and_keeps_state() {
        let (_tmp, store) = test_store().await;
        // A non-empty directory where the data file should be makes the rename fail.
        std::fs::create_dir_all(store.path().join("blocker")).unwrap();

        let result = store.create_user_with_password("a@b.c", "aa", "bb").await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
        assert!(!store.temp_path().exists());
        assert!(store.get_user_by_email("a@b.c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let (_tmp, store) = test_store().await;
        assert!(store.get_user_by_email("a@b.c").await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn create_user_conflicts_when_password_set() {
        let (_tmp, store) = test_store().await;
        store
            .create_user_with_password("a@b.c", "aa", "bb")
            .await
            .unwrap();

        let second = store.create_user_with_password("a@b.c", "cc", "dd").await;
        assert!(matches!(second, Err(PortError::Conflict(_))));

        let creds = store.get_user_by_email("a@b.c").await.unwrap().unwrap();
        assert_eq!(creds.password(), Some(("aa", "bb")));
    }

    #[tokio::test]
    async fn password_less_row_is_claimed() {
        let (tmp, store) = test_store().await;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let seeded = FileDatabase {
            users: vec![StoredUser {
                id,
                email: "a@b.c".into(),
                password_hash: None,
                password_salt: None,
                created_at: now,
                updated_at: now,
            }],
            ..Default::default()
        };
        store.persist(&seeded).await.unwrap();
        drop(store);

        let store = FileAdapter::open(tmp.path().join("data").join("db.json"))
            .await
            .unwrap();
        let user = store
            .create_user_with_password("a@b.c", "aa", "bb")
            .await
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn new_session_replaces_previous_one() {
        let (_tmp, store) = test_store().await;
        let user = store
            .create_user_with_password("a@b.c", "aa", "bb")
            .await
            .unwrap();

        store.replace_auth_session("t1", user.id).await.unwrap();
        store.replace_auth_session("t2", user.id).await.unwrap();

        assert!(store.validate_auth_session("t1").await.unwrap().is_none());
        assert_eq!(
            store.validate_auth_session("t2").await.unwrap().map(|u| u.id),
            Some(user.id)
        );

        store.delete_auth_session("t2").await.unwrap();
        store.delete_auth_session("t2").await.unwrap();
        assert!(store.validate_auth_session("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_for_unknown_user_is_not_found() {
        let (_tmp, store) = test_store().await;
        let result = store.replace_auth_session("t1", Uuid::new_v4()).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn contacts_are_replaced_per_user_and_survive_reopen() {
        let (tmp, store) = test_store().await;
        let alice = store
            .create_user_with_password("alice@b.c", "aa", "bb")
            .await
            .unwrap();
        let bob = store
            .create_user_with_password("bob@b.c", "aa", "bb")
            .await
            .unwrap();

        store
            .replace_contacts_for_user(alice.id, &[contact("1", "Old", (2023, 1, 1))])
            .await
            .unwrap();
        store
            .replace_contacts_for_user(bob.id, &[contact("1", "Bob's", (2023, 6, 1))])
            .await
            .unwrap();
        let count = store
            .replace_contacts_for_user(
                alice.id,
                &[contact("2", "Older", (2024, 1, 1)), contact("3", "Newer", (2024, 5, 1))],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let reopened = FileAdapter::open(tmp.path().join("data").join("db.json"))
            .await
            .unwrap();
        let names: Vec<_> = reopened
            .get_contacts_for_user(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Newer", "Older"]);
        assert_eq!(reopened.get_contacts_for_user(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            FileAdapter::open(&path).await,
            Err(PortError::Unexpected(_))
        ));
    }
}
