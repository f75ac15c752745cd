//! Username/password login backed by replicated account records.
//!
//! The first login for a username registers an account under
//! `auth.users.<username>` holding an Argon2id hash of the password. Later
//! logins, on this node or on any node the account has replicated to, must
//! present the same password. The resulting [`AuthSession`] is published on a
//! `tokio::sync::watch` channel so UIs can react to login and logout.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    Result,
    constants::USERS_PREFIX,
    store::{Store, join_key, validate_key},
};

pub mod crypto;
mod errors;

pub use errors::AuthError;

/// Who is logged in on this node, if anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub username: Option<String>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

/// Stored account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub password_hash: String,
}

/// Store key holding the account for `username`.
pub fn account_key(username: &str) -> String {
    join_key(USERS_PREFIX, username)
}

/// Login state for one node.
#[derive(Debug)]
pub struct Auth {
    store: Store,
    session: watch::Sender<AuthSession>,
}

impl Auth {
    pub fn new(store: Store) -> Self {
        let (session, _) = watch::channel(AuthSession::default());
        Self { store, session }
    }

    /// Log in, registering the account if the username is unknown.
    ///
    /// Hashing is deliberately slow; async callers should run this on a
    /// blocking thread.
    pub fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        if username.is_empty() {
            return Err(AuthError::EmptyUsername.into());
        }
        let key = account_key(username);
        validate_key(&key).map_err(|e| AuthError::InvalidUsername {
            username: username.to_string(),
            reason: e.to_string(),
        })?;

        match self.store.get(&key) {
            Some(json) => {
                let account: Account =
                    serde_json::from_str(&json).map_err(|e| AuthError::CorruptAccount {
                        username: username.to_string(),
                        reason: e.to_string(),
                    })?;
                if let Err(e) = crypto::verify_password(username, password, &account.password_hash)
                {
                    warn!(username, "Login rejected");
                    return Err(e);
                }
                info!(username, "Logged in");
            }
            None => {
                let account = Account {
                    password_hash: crypto::hash_password(password)?,
                };
                self.store.put(key, serde_json::to_string(&account)?)?;
                info!(username, "Registered new account");
            }
        }

        let session = AuthSession {
            username: Some(username.to_string()),
        };
        self.session.send_replace(session.clone());
        Ok(session)
    }

    /// Clear the current session.
    pub fn logout(&self) {
        let previous = self.session.send_replace(AuthSession::default());
        if let Some(username) = previous.username {
            info!(username, "Logged out");
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> AuthSession {
        self.session.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn watch(&self) -> watch::Receiver<AuthSession> {
        self.session.subscribe()
    }
}
