//! Password hashing and verification using argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

const PHC_PREFIX: &str = "$argon2";

#[derive(Error, Debug)]
#[error("password hashing: {0}")]
pub struct CredentialError(String);

impl From<password_hash::Error> for CredentialError {
    fn from(e: password_hash::Error) -> Self {
        CredentialError(e.to_string())
    }
}

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored value. Values that are not argon2 PHC strings
/// are legacy cleartext rows and are compared directly. Only a mismatch is `Ok(false)`;
/// a stored hash that cannot be parsed or recomputed is an error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CredentialError> {
    if !stored.starts_with(PHC_PREFIX) {
        return Ok(password == stored);
    }
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
