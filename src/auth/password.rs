use argon2::{
    password_hash::{Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

/// Credential hashing failures. Neither variant means "wrong password";
/// a mismatch is `Ok(false)` from [`verify_password`].
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("could not hash new user password: {0}")]
    Hash(HashError),
    #[error("stored user password hash is unreadable: {0}")]
    MalformedStoredHash(HashError),
}

lazy_static! {
    // Checked against when the email is unknown so that login costs one
    // argon2 verification either way.
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-user").ok();
}

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 failed to hash password");
            PasswordError::Hash(e)
        })
}

pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash does not parse");
        PasswordError::MalformedStoredHash(e)
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Burns one verification for a login whose email has no account.
pub fn verify_against_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}
