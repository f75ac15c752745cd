//! The node: one store, one login session, one set of peer links.
//!
//! `Node` is the facade applications use. It is a cheap-to-clone handle
//! around shared state.
//!
//! ## Example
//!
//! ```
//! # use parley::{Node, NodeConfig};
//! # #[tokio::main]
//! # async fn main() -> parley::Result<()> {
//! let node = Node::open(NodeConfig::default()).await?;
//! node.login("alice", "secret").await?;
//! node.put("my.messages.1", r#"{"text":"hi","username":"alice"}"#)?;
//! assert_eq!(node.keys("my.messages"), vec!["1".to_string()]);
//! # Ok(())
//! # }
//! ```

use std::{path::PathBuf, sync::Arc};

use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::{
    Result,
    auth::{Auth, AuthError, AuthSession},
    store::{Change, KeysWatch, Store, ValueWatch},
    sync::{PeerSync, transports::http::HttpTransport},
};

mod config;

pub use config::NodeConfig;

struct NodeInternal {
    store: Store,
    auth: Auth,
    sync: PeerSync,
    data_file: Option<PathBuf>,
}

impl std::fmt::Debug for NodeInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInternal")
            .field("node_id", &self.store.node_id())
            .field("records", &self.store.len())
            .field("session", &self.auth.session())
            .field("peers", &self.sync.peers())
            .field("data_file", &self.data_file)
            .finish()
    }
}

/// Handle to a running node.
#[derive(Debug, Clone)]
pub struct Node {
    inner: Arc<NodeInternal>,
}

impl Node {
    /// Open a node. Resolves once the store is loaded and the node is ready
    /// for reads, writes and dialing.
    pub async fn open(config: NodeConfig) -> Result<Self> {
        let node_id = config
            .node_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let store = match &config.data_file {
            Some(path) if path.exists() => {
                Store::load_from_file(path, node_id.clone(), config.clock.clone())?
            }
            _ => Store::new(node_id.clone(), config.clock.clone()),
        };

        let transport = Arc::new(HttpTransport::with_timeout(config.request_timeout)?);
        let sync = PeerSync::new(store.clone(), transport, config.sync_interval);
        let auth = Auth::new(store.clone());

        info!(node_id = %node_id, records = store.len(), "Node ready");
        Ok(Self {
            inner: Arc::new(NodeInternal {
                store,
                auth,
                sync,
                data_file: config.data_file,
            }),
        })
    }

    pub fn id(&self) -> &str {
        self.inner.store.node_id()
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn sync(&self) -> &PeerSync {
        &self.inner.sync
    }

    /// Log in, registering the account on first use.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        let node = self.clone();
        let username = username.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || node.inner.auth.login(&username, &password))
            .await
            .map_err(|e| AuthError::HashingFailed {
                reason: format!("login task failed: {e}"),
            })?
    }

    pub fn logout(&self) {
        self.inner.auth.logout();
    }

    /// Current login session.
    pub fn auth(&self) -> AuthSession {
        self.inner.auth.session()
    }

    pub fn watch_auth(&self) -> watch::Receiver<AuthSession> {
        self.inner.auth.watch()
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<Change> {
        self.inner.store.put(key, value)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.store.get(key)
    }

    /// Next key segments under `prefix`. See [`Store::keys`].
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.inner.store.keys(prefix)
    }

    pub fn watch_value(&self, key: impl Into<String>) -> ValueWatch {
        self.inner.store.watch_value(key)
    }

    pub fn watch_keys(&self, prefix: impl Into<String>) -> KeysWatch {
        self.inner.store.watch_keys(prefix)
    }

    /// Serve this node to peers on `addr`; returns the bound address.
    pub async fn serve(&self, addr: &str) -> Result<String> {
        self.inner.sync.serve(addr).await
    }

    pub async fn stop_serving(&self) -> Result<()> {
        self.inner.sync.stop_serving().await
    }

    pub fn server_address(&self) -> Option<String> {
        self.inner.sync.server_address()
    }

    /// Start replicating with the peer at `address`. See [`PeerSync::dial`].
    pub fn dial(&self, address: &str) -> Result<bool> {
        self.inner.sync.dial(address)
    }

    pub fn peers(&self) -> Vec<String> {
        self.inner.sync.peers()
    }

    pub async fn disconnect(&self, address: &str) -> Result<()> {
        self.inner.sync.disconnect(address).await
    }

    /// Persist the store to the configured data file, if any.
    pub fn save(&self) -> Result<()> {
        match &self.inner.data_file {
            Some(path) => self.inner.store.save_to_file(path),
            None => Ok(()),
        }
    }

    /// Stop links and server, then persist.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.sync.shutdown().await;
        self.save()
    }
}
