//! services/api/src/web/sync.rs
//!
//! The contact synchronization endpoints. A pull returns the user's whole
//! contact set; a push replaces it wholesale with the sanitized submission.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use job_tracker_core::contacts::sanitize_contacts;
use job_tracker_core::domain::{Contact, ContactDraft};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::auth::UserView;
use crate::web::middleware::AuthUser;
use crate::web::response::{ErrorBody, HttpError, MSG_BAD_REQUEST, MSG_CONTACTS_NOT_ARRAY};
use crate::web::state::AppState;

//=========================================================================================
// Payload Structs
//=========================================================================================

/// A contact as sent by a client. Every field is optional at this stage.
///
/// Fields are read as raw JSON so that a value of an unexpected type only
/// clears that field. Whether the record is kept is decided later, from its
/// name, organisation and date alone.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactPayload {
    /// Client-side identifier; numbers are accepted and kept as text.
    #[schema(value_type = Option<String>)]
    pub id: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub name: Option<serde_json::Value>,
    #[serde(alias = "organization")]
    #[schema(value_type = Option<String>)]
    pub organisation: Option<serde_json::Value>,
    /// Call date, `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[schema(value_type = Option<String>)]
    pub date: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub time: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub expertise: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub inclusivity: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub notes: Option<serde_json::Value>,
    /// RFC 3339 timestamp; anything else is replaced by the server time.
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<serde_json::Value>,
}

impl From<ContactPayload> for ContactDraft {
    fn from(p: ContactPayload) -> Self {
        ContactDraft {
            id: p.id.and_then(id_to_string),
            name: p.name.and_then(text),
            organisation: p.organisation.and_then(text),
            date: p.date.and_then(text),
            time: p.time.and_then(text),
            expertise: p.expertise.and_then(text),
            inclusivity: p.inclusivity.and_then(text),
            notes: p.notes.and_then(text),
            updated_at: p.updated_at.and_then(text),
        }
    }
}

// Ids of any other JSON type are treated as missing.
fn id_to_string(id: serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Non-string values are treated as missing.
fn text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

/// A stored contact as returned to clients.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub organisation: String,
    pub date: NaiveDate,
    pub time: String,
    pub expertise: String,
    pub inclusivity: String,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactView {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            organisation: c.organisation,
            date: c.call_date,
            time: c.call_time,
            expertise: c.expertise,
            inclusivity: c.inclusivity,
            notes: c.notes,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPullResponse {
    pub user: UserView,
    pub contacts: Vec<ContactView>,
    pub synced_at: DateTime<Utc>,
}

/// Elements are validated one by one, so a malformed entry only drops itself.
#[derive(Deserialize, ToSchema)]
pub struct SyncPushRequest {
    #[schema(value_type = Vec<ContactPayload>)]
    pub contacts: Vec<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPushResponse {
    pub ok: bool,
    pub count: usize,
    pub synced_at: DateTime<Utc>,
}

/// Converts raw JSON elements into drafts, skipping anything that is not a contact object.
fn drafts_from_values(values: Vec<serde_json::Value>) -> Vec<ContactDraft> {
    values
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|value| serde_json::from_value::<ContactPayload>(value).ok())
        .map(ContactDraft::from)
        .collect()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/sync - Fetch every contact of the authenticated user
#[utoipa::path(
    get,
    path = "/api/sync",
    responses(
        (status = 200, description = "The user's contacts, newest call first", body = SyncPullResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn pull_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let contacts = state.db.get_contacts_for_user(user.id).await?;

    Ok(Json(SyncPullResponse {
        user: user.into(),
        contacts: contacts.into_iter().map(ContactView::from).collect(),
        synced_at: Utc::now(),
    }))
}

/// PUT /api/sync - Replace every contact of the authenticated user
#[utoipa::path(
    put,
    path = "/api/sync",
    request_body = SyncPushRequest,
    responses(
        (status = 200, description = "Contacts replaced", body = SyncPushResponse),
        (status = 400, description = "Body is not an object with a contacts list", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn push_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    payload: Result<Json<SyncPushRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = payload.map_err(|e| {
        warn!(user_id = %user.id, "Rejected sync payload: {}", e);
        match e {
            // Well-formed JSON of the wrong shape.
            JsonRejection::JsonDataError(_) => HttpError::bad_request(MSG_CONTACTS_NOT_ARRAY),
            _ => HttpError::bad_request(MSG_BAD_REQUEST),
        }
    })?;

    let submitted = req.contacts.len();
    let now = Utc::now();
    let contacts = sanitize_contacts(drafts_from_values(req.contacts), now);
    let count = state
        .db
        .replace_contacts_for_user(user.id, &contacts)
        .await?;
    info!(user_id = %user.id, submitted, stored = count, "Contacts replaced");

    Ok(Json(SyncPushResponse {
        ok: true,
        count,
        synced_at: now,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numeric_ids_and_american_spelling() {
        let drafts = drafts_from_values(vec![json!({
            "id": 1712345678901u64,
            "name": "Alice",
            "organization": "Acme",
            "date": "2024-04-05",
            "updatedAt": "2024-04-05T10:00:00Z"
        })]);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id.as_deref(), Some("1712345678901"));
        assert_eq!(drafts[0].organisation.as_deref(), Some("Acme"));
        assert_eq!(drafts[0].updated_at.as_deref(), Some("2024-04-05T10:00:00Z"));
    }

    #[test]
    fn skips_non_objects_and_clears_mistyped_fields() {
        let drafts = drafts_from_values(vec![
            json!("not a contact"),
            json!(42),
            json!({ "name": "Bob", "organisation": "Acme", "date": "2024-01-01", "notes": null }),
            json!({ "name": "Eve", "organisation": "Acme", "date": "2024-01-02",
                    "notes": 42, "time": ["10:00"], "updatedAt": 1712345678901u64 }),
        ]);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name.as_deref(), Some("Bob"));
        assert!(drafts[0].notes.is_none());
        assert_eq!(drafts[1].name.as_deref(), Some("Eve"));
        assert!(drafts[1].notes.is_none());
        assert!(drafts[1].time.is_none());
        assert!(drafts[1].updated_at.is_none());
    }

    #[test]
    fn mistyped_mandatory_field_drops_only_that_contact() {
        let now = Utc::now();
        let contacts = sanitize_contacts(
            drafts_from_values(vec![
                json!({ "name": 7, "organisation": "Acme", "date": "2024-01-01" }),
                json!({ "name": "Bob", "organisation": "Acme", "date": "2024-01-01", "notes": 42 }),
            ]),
            now,
        );
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Bob");
        assert_eq!(contacts[0].notes, "");
    }

    #[test]
    fn contact_view_uses_camel_case() {
        let view = ContactView::from(Contact {
            id: "c1".into(),
            name: "Alice".into(),
            organisation: "Acme".into(),
            call_date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            call_time: "14:30".into(),
            expertise: String::new(),
            inclusivity: String::new(),
            notes: String::new(),
            updated_at: Utc::now(),
        });
        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["date"], "2024-04-05");
        assert_eq!(value["time"], "14:30");
        assert!(value.get("updatedAt").is_some());
    }
}
