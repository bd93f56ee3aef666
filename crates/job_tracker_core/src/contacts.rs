//! crates/job_tracker_core/src/contacts.rs
//!
//! Validation and ordering of contact records received during a sync push.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Contact, ContactDraft};

/// Parses a call date given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_call_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

fn trimmed(field: Option<String>) -> String {
    field.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Turns one draft into a storable contact, or `None` when a mandatory field is
/// missing. The id is left empty when the client did not send one.
fn sanitize_contact(draft: ContactDraft, now: DateTime<Utc>) -> Option<Contact> {
    let name = trimmed(draft.name);
    let organisation = trimmed(draft.organisation);
    if name.is_empty() || organisation.is_empty() {
        return None;
    }
    let call_date = parse_call_date(draft.date.as_deref()?)?;

    let updated_at = draft
        .updated_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    Some(Contact {
        id: trimmed(draft.id),
        name,
        organisation,
        call_date,
        call_time: trimmed(draft.time),
        expertise: trimmed(draft.expertise),
        inclusivity: trimmed(draft.inclusivity),
        notes: trimmed(draft.notes),
        updated_at,
    })
}

/// Validates a pushed contact list.
///
/// Drafts without a name, an organisation or a parseable date are dropped.
/// Missing ids are generated, and an id already used earlier in the same list
/// is replaced with a fresh one so ids stay unique per user.
pub fn sanitize_contacts<I>(drafts: I, now: DateTime<Utc>) -> Vec<Contact>
where
    I: IntoIterator<Item = ContactDraft>,
{
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .filter_map(|draft| sanitize_contact(draft, now))
        .map(|mut contact| {
            if contact.id.is_empty() || seen.contains(&contact.id) {
                contact.id = Uuid::new_v4().to_string();
            }
            seen.insert(contact.id.clone());
            contact
        })
        .collect()
}

fn display_order(a: &Contact, b: &Contact) -> Ordering {
    b.call_date
        .cmp(&a.call_date)
        .then_with(|| b.call_time.cmp(&a.call_time))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sorts contacts newest call first, then by time descending, then by name
/// ignoring case. Both storage backends return contacts in this order.
pub fn sort_contacts(contacts: &mut [Contact]) {
    contacts.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, organisation: &str, date: &str) -> ContactDraft {
        ContactDraft {
            name: Some(name.to_string()),
            organisation: Some(organisation.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(parse_call_date("2024-03-14"), Some(expected));
        assert_eq!(parse_call_date("2024-03-14T09:30:00Z"), Some(expected));
        assert_eq!(parse_call_date("14/03/2024"), None);
        assert_eq!(parse_call_date(""), None);
    }

    #[test]
    fn drops_drafts_missing_mandatory_fields() {
        let now = Utc::now();
        let drafts = vec![
            draft("Alice", "Acme", "2024-01-02"),
            draft("", "Acme", "2024-01-02"),
            draft("Bob", "  ", "2024-01-02"),
            draft("Carol", "Acme", "not a date"),
            ContactDraft {
                name: Some("Dan".into()),
                organisation: Some("Acme".into()),
                ..Default::default()
            },
        ];

        let contacts = sanitize_contacts(drafts, now);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Alice");
    }

    #[test]
    fn fills_defaults_and_trims() {
        let now = Utc::now();
        let mut d = draft("  Alice ", " Acme ", "2024-01-02");
        d.notes = Some("  follow up  ".into());

        let contact = sanitize_contacts(vec![d], now).remove(0);
        assert_eq!(contact.name, "Alice");
        assert_eq!(contact.organisation, "Acme");
        assert_eq!(contact.notes, "follow up");
        assert_eq!(contact.expertise, "");
        assert_eq!(contact.call_time, "");
        assert_eq!(contact.updated_at, now);
        assert!(Uuid::parse_str(&contact.id).is_ok());
    }

    #[test]
    fn keeps_client_ids_and_regenerates_duplicates() {
        let now = Utc::now();
        let mut first = draft("Alice", "Acme", "2024-01-02");
        first.id = Some("c-1".into());
        let mut second = draft("Bob", "Globex", "2024-01-03");
        second.id = Some("c-1".into());

        let contacts = sanitize_contacts(vec![first, second], now);
        assert_eq!(contacts[0].id, "c-1");
        assert_ne!(contacts[1].id, "c-1");
        assert!(!contacts[1].id.is_empty());
    }

    #[test]
    fn keeps_valid_client_timestamp() {
        let now = Utc::now();
        let mut d = draft("Alice", "Acme", "2024-01-02");
        d.updated_at = Some("2024-01-05T10:00:00+01:00".into());

        let contact = sanitize_contacts(vec![d], now).remove(0);
        assert_eq!(contact.updated_at.to_rfc3339(), "2024-01-05T09:00:00+00:00");
    }

    #[test]
    fn sorts_newest_call_first() {
        let now = Utc::now();
        let mut late_morning = draft("Zoe", "Acme", "2024-02-01");
        late_morning.time = Some("11:00".into());
        let mut early_morning = draft("Yann", "Acme", "2024-02-01");
        early_morning.time = Some("09:00".into());
        let drafts = vec![
            draft("Old", "Acme", "2023-12-31"),
            early_morning,
            late_morning,
        ];

        let mut contacts = sanitize_contacts(drafts, now);
        sort_contacts(&mut contacts);
        let names: Vec<_> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Zoe", "Yann", "Old"]);
    }

    #[test]
    fn same_slot_sorts_names_ignoring_case() {
        let now = Utc::now();
        let drafts = vec![
            draft("bob", "Acme", "2024-02-01"),
            draft("Carol", "Acme", "2024-02-01"),
            draft("alice", "Acme", "2024-02-01"),
            draft("Bob", "Acme", "2024-02-01"),
        ];

        let mut contacts = sanitize_contacts(drafts, now);
        sort_contacts(&mut contacts);
        let names: Vec<_> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alice", "Bob", "bob", "Carol"]);
    }
}
