//! services/api/src/security.rs
//!
//! Password hashing and session token generation.
//!
//! Passwords are stretched with Argon2id in raw key-derivation mode: a random
//! 16-byte salt and fixed cost parameters produce a fixed 64-byte output. Hash
//! and salt are stored separately as hex strings, and verification re-derives
//! the hash and compares it in constant time.

use argon2::{
    password_hash::rand_core::{OsRng, RngCore},
    Algorithm, Argon2, Params, Version,
};

/// Memory cost in KiB.
const MEMORY_COST_KIB: u32 = 19_456;

/// Number of Argon2 passes over memory.
const ITERATIONS: u32 = 3;

const PARALLELISM: u32 = 1;

/// Derived key length in bytes.
const HASH_LEN: usize = 64;

/// Salt byte length.
const SALT_LEN: usize = 16;

/// Token byte length before hex encoding (32 bytes = 64 hex chars).
const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Key derivation failed: {0}")]
    Kdf(String),
    #[error("Stored credential is not valid hex: {0}")]
    Encoding(#[from] hex::FromHexError),
}

/// A freshly derived password hash with the salt used to produce it.
#[derive(Debug, Clone)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], HashError> {
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(HASH_LEN))
        .map_err(|e| HashError::Kdf(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; HASH_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| HashError::Kdf(e.to_string()))?;
    Ok(output)
}

/// Hashes a password with a new random salt.
pub fn hash_password(password: &str) -> Result<PasswordDigest, HashError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let hash = derive_key(password, &salt)?;
    Ok(PasswordDigest {
        hash: hex::encode(hash),
        salt: hex::encode(salt),
    })
}

/// Checks a password against a stored hex hash and salt.
pub fn verify_password(password: &str, hash: &str, salt: &str) -> Result<bool, HashError> {
    let expected = hex::decode(hash)?;
    let salt = hex::decode(salt)?;
    let actual = derive_key(password, &salt)?;
    Ok(constant_time_eq(&actual, &expected))
}

/// Generates an opaque bearer token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let digest = hash_password("correct horse").unwrap();
        assert_eq!(digest.hash.len(), HASH_LEN * 2);
        assert_eq!(digest.salt.len(), SALT_LEN * 2);

        assert!(verify_password("correct horse", &digest.hash, &digest.salt).unwrap());
        assert!(!verify_password("wrong horse", &digest.hash, &digest.salt).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(matches!(
            verify_password("password123", "zz-not-hex", "00112233445566778899aabbccddeeff"),
            Err(HashError::Encoding(_))
        ));
    }

    #[test]
    fn tokens_are_random_hex() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_eq!(t1.len(), TOKEN_BYTES * 2);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(t1, t2);
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
