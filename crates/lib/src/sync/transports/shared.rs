//! Server bookkeeping shared by transport implementations.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::sync::error::SyncError;

#[derive(Default)]
struct Running {
    address: String,
    shutdown: Option<oneshot::Sender<()>>,
}

/// Tracks whether a transport's server is running, where, and how to stop it.
///
/// Transports are shared between the node and its link tasks, so the state
/// sits behind a mutex and every method takes `&self`.
#[derive(Default)]
pub struct ServerState {
    running: Mutex<Option<Running>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    /// Address of the running server.
    pub fn get_address(&self) -> Result<String, SyncError> {
        self.lock()
            .as_ref()
            .map(|running| running.address.clone())
            .ok_or(SyncError::ServerNotRunning)
    }

    /// Record a started server. Fails if one is already recorded.
    pub fn server_started(
        &self,
        address: String,
        shutdown: oneshot::Sender<()>,
    ) -> Result<(), SyncError> {
        let mut running = self.lock();
        if let Some(current) = running.as_ref() {
            return Err(SyncError::ServerAlreadyRunning {
                address: current.address.clone(),
            });
        }
        *running = Some(Running {
            address,
            shutdown: Some(shutdown),
        });
        Ok(())
    }

    /// Signal shutdown and clear the state.
    pub fn stop_server(&self) -> Result<(), SyncError> {
        let mut stopped = self.lock().take().ok_or(SyncError::ServerNotRunning)?;
        if let Some(tx) = stopped.shutdown.take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
