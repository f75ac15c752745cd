//! Error types for the keyed record store.

use thiserror::Error;

/// Errors raised by [`Store`](super::Store) operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key is empty or contains an empty path segment.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Persisted store file uses a format this build cannot read.
    #[error("Unsupported store file version {version}; only version {supported} is supported")]
    UnsupportedVersion { version: u8, supported: u8 },

    /// Persisted store file could not be parsed.
    #[error("Corrupt store file '{path}': {reason}")]
    CorruptFile { path: String, reason: String },

    /// The change feed behind a subscription has been dropped.
    #[error("Subscription to '{target}' closed")]
    SubscriptionClosed { target: String },
}

impl StoreError {
    /// Check if this error was caused by a malformed key.
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, StoreError::InvalidKey { .. })
    }

    /// Check if this error is about the on-disk format.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedVersion { .. } | StoreError::CorruptFile { .. }
        )
    }

    /// Get the key if this is a key-related error
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::InvalidKey { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
