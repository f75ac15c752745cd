//! Password hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::AuthError;
use crate::Result;

/// Hash a password, returning the PHC-format hash string.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed {
            reason: e.to_string(),
        })?
        .to_string();
    Ok(hash)
}

/// Verify `password` against a PHC-format hash.
pub fn verify_password(
    username: &str,
    password: impl AsRef<str>,
    password_hash: impl AsRef<str>,
) -> Result<()> {
    let parsed = PasswordHash::new(password_hash.as_ref()).map_err(|e| {
        AuthError::CorruptAccount {
            username: username.to_string(),
            reason: e.to_string(),
        }
    })?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed)
        .map_err(|_| {
            AuthError::InvalidPassword {
                username: username.to_string(),
            }
            .into()
        })
}
