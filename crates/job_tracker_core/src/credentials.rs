//! crates/job_tracker_core/src/credentials.rs
//!
//! Email normalization and the registration rules for email/password pairs.

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
}

/// Emails are compared trimmed and lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Checks an already-normalized email and a password against the registration rules.
pub fn validate_registration(email: &str, password: &str) -> Result<(), CredentialError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn email_needs_at_sign_and_dot() {
        assert_eq!(
            validate_registration("alice.example.com", "longenough"),
            Err(CredentialError::InvalidEmail)
        );
        assert_eq!(
            validate_registration("alice@localhost", "longenough"),
            Err(CredentialError::InvalidEmail)
        );
        assert!(validate_registration("alice@example.com", "longenough").is_ok());
    }

    #[test]
    fn password_length_counts_characters() {
        assert_eq!(
            validate_registration("a@b.c", "short"),
            Err(CredentialError::PasswordTooShort)
        );
        // Eight multi-byte characters are enough.
        assert!(validate_registration("a@b.c", "éééééééé").is_ok());
    }
}
