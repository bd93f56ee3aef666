pub mod contacts;
pub mod credentials;
pub mod domain;
pub mod ports;

pub use contacts::{parse_call_date, sanitize_contacts, sort_contacts};
pub use credentials::{normalize_email, validate_registration, CredentialError, MIN_PASSWORD_LEN};
pub use domain::{AuthSession, Contact, ContactDraft, User, UserCredentials};
pub use ports::{DatabaseService, PortError, PortResult};
