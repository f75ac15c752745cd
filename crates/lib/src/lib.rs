//!
//! Parley: a small replicated key-value store with login and peer sync.
//!
//! ## Core Concepts
//!
//! * **Store (`store::Store`)**: dot-separated keys mapping to string values.
//!   Each value is wrapped in a `Record` carrying a timestamp and the id of
//!   the writing node; concurrent writes resolve last-writer-wins.
//! * **Subscriptions (`store::ValueWatch`, `store::KeysWatch`)**: snapshots of
//!   a value or of the keys under a prefix that update as writes land.
//! * **Auth (`auth::Auth`)**: username/password login whose accounts are
//!   stored as ordinary records and therefore replicate.
//! * **Sync (`sync::PeerSync`)**: an HTTP endpoint serving the store plus one
//!   polling link per dialed peer.
//! * **Node (`Node`)**: the facade bundling all of the above.
//! * **Test network (`testnet::TestNetwork`)**: several nodes on local ports
//!   wired into a topology, for demos and tests.

pub mod auth;
pub mod clock;
pub mod constants;
pub mod node;
pub mod store;
pub mod sync;
pub mod testnet;

pub use clock::{Clock, SystemClock};
pub use node::{Node, NodeConfig};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Parley library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Parley library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured sync errors from the sync module
    #[error(transparent)]
    Sync(sync::SyncError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Store(_) => "store",
            Error::Auth(_) => "auth",
            Error::Sync(_) => "sync",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(io_err) => io_err.kind() == std::io::ErrorKind::NotFound,
            Error::Sync(sync_err) => sync_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// Check if this error means the supplied credentials were rejected.
    pub fn is_invalid_credentials(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_invalid_credentials(),
            _ => false,
        }
    }

    /// Check if this error is network-related.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_network_error(),
            _ => false,
        }
    }

    /// Check if this error comes from a misbehaving or incompatible peer.
    pub fn is_protocol_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_protocol_error(),
            _ => false,
        }
    }

    /// Check if this error was caused by a malformed key.
    pub fn is_invalid_key(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_invalid_key(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Store(store_err) => store_err.is_persistence_error(),
            _ => false,
        }
    }
}
