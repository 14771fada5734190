use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::LazyLock;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,
    #[error("random source unavailable")]
    Random,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub fn validate_policy(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Argon2id PHC string for storage in `users.password_hash`.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|_| PasswordError::Random)?;
    hash_with_salt(password, &salt_bytes)
}

fn hash_with_salt(password: &str, salt_bytes: &[u8]) -> Result<String, PasswordError> {
    let salt = SaltString::encode_b64(salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

// Same parameters as real hashes, so checking against it costs the same.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_with_salt("no-such-account", &[0x5a; 16]).ok());

/// Login check. With no stored hash (unknown email) a full verify still runs
/// against a dummy hash and the answer is false.
pub fn verify_account(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(stored) => verify(password, stored),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify(password, dummy);
            }
            false
        }
    }
}

/// False for a wrong password and for an unparseable stored hash.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
