//! Peer synchronization for a node's store.
//!
//! [`PeerSync`] owns a transport, optionally serves the node's store to
//! other peers, and keeps one outbound [`link`] task per dialed address.
//! Replication is last-writer-wins per key (see [`crate::store::Record`]).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{Result, store::Store};

pub mod error;
pub mod handler;
mod link;
pub mod protocol;
pub mod transports;

pub use error::SyncError;
use handler::StoreSyncHandler;
use link::Link;
use transports::{SyncTransport, http::normalize_address};

struct LinkHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Sync state of one node: its server and its outbound links.
pub struct PeerSync {
    store: Store,
    transport: Arc<dyn SyncTransport>,
    interval: Duration,
    links: Mutex<HashMap<String, LinkHandle>>,
}

impl PeerSync {
    pub fn new(store: Store, transport: Arc<dyn SyncTransport>, interval: Duration) -> Self {
        Self {
            store,
            transport,
            interval,
            links: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &Arc<dyn SyncTransport> {
        &self.transport
    }

    /// Serve the store on `addr` and return the bound address.
    pub async fn serve(&self, addr: &str) -> Result<String> {
        let handler = Arc::new(StoreSyncHandler::new(self.store.clone()));
        self.transport.start_server(addr, handler).await?;
        self.transport.get_server_address()
    }

    pub async fn stop_serving(&self) -> Result<()> {
        self.transport.stop_server().await
    }

    /// Bound server address, if serving.
    pub fn server_address(&self) -> Option<String> {
        self.transport.get_server_address().ok()
    }

    /// Start replicating with the peer at `address`.
    ///
    /// Returns false when a link to the address already exists. The link
    /// connects in the background; an unreachable peer is retried every
    /// interval. Must be called within a tokio runtime.
    pub fn dial(&self, address: &str) -> Result<bool> {
        let address = normalize_address(address)?;
        let mut links = self.lock_links();
        if links.contains_key(&address) {
            debug!(peer = %address, "Already linked");
            return Ok(false);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let link = Link::new(
            address.clone(),
            self.store.clone(),
            self.transport.clone(),
            self.interval,
        );
        let task = link.spawn(shutdown_rx);
        info!(peer = %address, "Dialing peer");
        links.insert(address, LinkHandle { shutdown, task });
        Ok(true)
    }

    /// Addresses of dialed peers, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.lock_links().keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Stop the link to `address`.
    pub async fn disconnect(&self, address: &str) -> Result<()> {
        let address = normalize_address(address)?;
        let handle = self
            .lock_links()
            .remove(&address)
            .ok_or_else(|| SyncError::PeerNotFound(address.clone()))?;
        stop_link(handle).await;
        info!(peer = %address, "Disconnected from peer");
        Ok(())
    }

    /// Stop every link and the server.
    pub async fn shutdown(&self) {
        let handles: Vec<LinkHandle> = self.lock_links().drain().map(|(_, h)| h).collect();
        for handle in handles {
            stop_link(handle).await;
        }
        if self.transport.is_server_running() {
            let _ = self.transport.stop_server().await;
        }
    }

    fn lock_links(&self) -> std::sync::MutexGuard<'_, HashMap<String, LinkHandle>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PeerSync {
    fn drop(&mut self) {
        for (_, handle) in self.lock_links().drain() {
            let _ = handle.shutdown.send(true);
        }
    }
}

async fn stop_link(handle: LinkHandle) {
    let _ = handle.shutdown.send(true);
    let _ = handle.task.await;
}
