//! Server-side handling of sync requests.
//!
//! The handler is transport-agnostic: any transport that can deliver a
//! [`SyncRequest`] and return a [`SyncResponse`] can host it.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::protocol::{PROTOCOL_VERSION, SyncRequest, SyncResponse};
use crate::store::Store;

/// Processes incoming sync requests.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    async fn handle_request(&self, request: &SyncRequest) -> SyncResponse;
}

/// Handler that answers requests from a node's [`Store`].
#[derive(Debug, Clone)]
pub struct StoreSyncHandler {
    store: Store,
}

impl StoreSyncHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SyncHandler for StoreSyncHandler {
    async fn handle_request(&self, request: &SyncRequest) -> SyncResponse {
        match request {
            SyncRequest::Hello { node_id, version } => {
                if *version != PROTOCOL_VERSION {
                    warn!(peer = %node_id, version, "Refusing peer with other protocol version");
                    return SyncResponse::Error(format!(
                        "unsupported protocol version {version}, expected {PROTOCOL_VERSION}"
                    ));
                }
                debug!(peer = %node_id, "Hello");
                SyncResponse::Hello {
                    node_id: self.store.node_id().to_string(),
                    version: PROTOCOL_VERSION,
                    epoch: self.store.epoch().to_string(),
                }
            }
            SyncRequest::Push { from, records } => {
                match self.store.merge(records.iter().cloned()) {
                    Ok(count) => {
                        debug!(peer = %from, offered = records.len(), accepted = count, "Push");
                        SyncResponse::Merged(count)
                    }
                    Err(e) => SyncResponse::Error(e.to_string()),
                }
            }
            SyncRequest::Pull { since } => {
                let (records, cursor) = self.store.changes_since(*since);
                SyncResponse::Changes { records, cursor }
            }
        }
    }
}
