//! HTTP transport implementation for sync communication.
//!
//! A single JSON endpoint (`POST /api/v0`) served with axum; requests are
//! sent with reqwest.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Json as ExtractJson, State},
    response::Json,
    routing::post,
};
use tokio::sync::oneshot;
use tracing::{error, info};
use url::Url;

use super::{SyncTransport, check_response, shared::ServerState};
use crate::{
    Result,
    constants::SYNC_PATH,
    sync::{
        error::SyncError,
        handler::SyncHandler,
        protocol::{SyncRequest, SyncResponse},
    },
};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP transport implementation using axum and reqwest.
pub struct HttpTransport {
    server_state: ServerState,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            server_state: ServerState::new(),
            client,
        })
    }

    fn create_router(handler: Arc<dyn SyncHandler>) -> Router {
        Router::new()
            .route(SYNC_PATH, post(handle_sync_request))
            .with_state(handler)
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    fn transport_type(&self) -> &'static str {
        "http"
    }

    async fn start_server(&self, addr: &str, handler: Arc<dyn SyncHandler>) -> Result<()> {
        if let Ok(address) = self.server_state.get_address() {
            return Err(SyncError::ServerAlreadyRunning { address }.into());
        }

        let socket_addr: SocketAddr = addr.parse().map_err(|e| SyncError::ServerBind {
            address: addr.to_string(),
            reason: format!("Invalid address: {e}"),
        })?;
        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .map_err(|e| SyncError::ServerBind {
                address: addr.to_string(),
                reason: e.to_string(),
            })?;
        // Actual bound address, which matters for port 0.
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.server_state
            .server_started(local_addr.to_string(), shutdown_tx)?;

        let router = Self::create_router(handler);
        tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!(address = %local_addr, error = %e, "Sync server failed");
            }
        });

        info!(address = %local_addr, "Sync server listening");
        Ok(())
    }

    async fn stop_server(&self) -> Result<()> {
        self.server_state.stop_server()?;
        Ok(())
    }

    async fn send_request(&self, address: &str, request: &SyncRequest) -> Result<SyncResponse> {
        let url = format!("http://{address}{SYNC_PATH}");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| SyncError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SyncError::Network(format!(
                "Server returned error: {}",
                response.status()
            ))
            .into());
        }

        let sync_response: SyncResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Network(format!("Failed to parse response: {e}")))?;

        check_response(sync_response)
    }

    fn is_server_running(&self) -> bool {
        self.server_state.is_running()
    }

    fn get_server_address(&self) -> Result<String> {
        Ok(self.server_state.get_address()?)
    }
}

/// Handler for the sync endpoint: JSON `SyncRequest` in, JSON `SyncResponse` out.
async fn handle_sync_request(
    State(handler): State<Arc<dyn SyncHandler>>,
    ExtractJson(request): ExtractJson<SyncRequest>,
) -> Json<SyncResponse> {
    Json(handler.handle_request(&request).await)
}

/// Reduce a peer address to the `host:port` form used on the wire.
///
/// Accepts bare `host:port` as well as URLs with any scheme, so
/// `ws://localhost:11111` and `127.0.0.1:11111` both work.
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let invalid = |reason: &str| SyncError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid("address is empty").into());
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    }
    .map_err(|e| invalid(&e.to_string()))?;

    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port"))?;
    Ok(format!("{host}:{port}"))
}
