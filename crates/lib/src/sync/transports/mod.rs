//! Transport abstractions for sync communication.
//!
//! Links and the node talk to peers through [`SyncTransport`], so the wire
//! format and server stack stay swappable. HTTP is the only implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Result,
    sync::{
        SyncError,
        handler::SyncHandler,
        protocol::{SyncRequest, SyncResponse},
    },
};

pub mod http;
pub mod shared;

/// Server and client side of a sync transport.
///
/// Implementations are shared between the node and its link tasks, so every
/// method takes `&self`.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Transport type identifier, e.g. "http".
    fn transport_type(&self) -> &'static str;

    /// Start a server on `addr` (port 0 picks a free port) that answers
    /// requests with `handler`.
    async fn start_server(&self, addr: &str, handler: Arc<dyn SyncHandler>) -> Result<()>;

    /// Stop the running server gracefully.
    async fn stop_server(&self) -> Result<()>;

    /// Send a request to the peer at `address` and wait for its response.
    async fn send_request(&self, address: &str, request: &SyncRequest) -> Result<SyncResponse>;

    fn is_server_running(&self) -> bool;

    /// Address the server is bound to. Useful after binding port 0.
    fn get_server_address(&self) -> Result<String>;
}

/// Map a peer's `Error` response into a [`SyncError`], passing others through.
pub(crate) fn check_response(response: SyncResponse) -> Result<SyncResponse> {
    match response {
        SyncResponse::Error(msg) => Err(SyncError::Remote(msg).into()),
        other => Ok(other),
    }
}
