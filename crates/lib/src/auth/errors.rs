//! Authentication error types.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors that can occur while logging in.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// Username was empty.
    #[error("Username must not be empty")]
    EmptyUsername,

    /// Username cannot be used as a key segment.
    #[error("Invalid username '{username}': {reason}")]
    InvalidUsername { username: String, reason: String },

    /// Password did not match the stored account.
    #[error("Invalid password for user '{username}'")]
    InvalidPassword { username: String },

    /// Stored account record could not be decoded.
    #[error("Account record for '{username}' is corrupt: {reason}")]
    CorruptAccount { username: String, reason: String },

    /// Password hashing failed.
    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },
}

impl AuthError {
    /// Check if this error means the credentials were rejected.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::InvalidPassword { .. })
    }

    /// Check if this error is about the supplied username.
    pub fn is_invalid_username(&self) -> bool {
        matches!(
            self,
            AuthError::EmptyUsername | AuthError::InvalidUsername { .. }
        )
    }

    /// Username involved in the error, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            AuthError::InvalidUsername { username, .. }
            | AuthError::InvalidPassword { username }
            | AuthError::CorruptAccount { username, .. } => Some(username),
            _ => None,
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
