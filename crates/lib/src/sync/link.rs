//! Outbound link to a single peer.
//!
//! A link runs as its own task. Each round it handshakes if needed, pushes
//! local changes since its push cursor and pulls remote changes since its
//! pull cursor. Rounds run when the store changes or the interval elapses.
//! Failures are logged and the next round starts over with a handshake.
//!
//! Cursors are only meaningful within one store epoch of the peer. When the
//! handshake reports a different epoch, or a pull returns a cursor behind
//! ours, the peer restarted with fresh sequence numbers: both cursors are
//! reset so it receives everything again and we re-read all of its records.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast::error::RecvError, watch},
    time::MissedTickBehavior,
};
use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    SyncError,
    protocol::{PROTOCOL_VERSION, SyncRequest, SyncResponse},
    transports::SyncTransport,
};
use crate::{Result, store::Store};

#[derive(Debug, Default)]
struct LinkState {
    connected: bool,
    remote_epoch: Option<String>,
    push_cursor: u64,
    pull_cursor: u64,
}

pub(crate) struct Link {
    address: String,
    store: Store,
    transport: Arc<dyn SyncTransport>,
    interval: Duration,
}

impl Link {
    pub(crate) fn new(
        address: String,
        store: Store,
        transport: Arc<dyn SyncTransport>,
        interval: Duration,
    ) -> Self {
        Self {
            address,
            store,
            transport,
            interval,
        }
    }

    /// Spawn the link loop. It stops when `shutdown` flips to true or its
    /// sender is dropped.
    pub(crate) fn spawn(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        let span = info_span!("link", peer = %self.address);
        tokio::spawn(self.run(shutdown).instrument(span))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut changes = self.store.subscribe();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut state = LinkState::default();

        loop {
            if let Err(e) = self.round(&mut state).await {
                if state.connected {
                    warn!(error = %e, "Lost connection to peer");
                } else {
                    debug!(error = %e, "Peer unreachable");
                }
                state.connected = false;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                received = changes.recv() => {
                    if let Err(RecvError::Closed) = received {
                        break;
                    }
                    // One round covers every change queued so far.
                    while changes.try_recv().is_ok() {}
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Link stopped");
    }

    async fn round(&self, state: &mut LinkState) -> Result<()> {
        if !state.connected {
            self.handshake(state).await?;
        }

        let (records, cursor) = self.store.changes_since(state.push_cursor);
        if !records.is_empty() {
            let offered = records.len();
            let request = SyncRequest::Push {
                from: self.store.node_id().to_string(),
                records,
            };
            match self.transport.send_request(&self.address, &request).await? {
                SyncResponse::Merged(accepted) => {
                    debug!(offered, accepted, "Pushed records");
                }
                other => return Err(unexpected("Merged", &other)),
            }
        }
        state.push_cursor = cursor;

        let request = SyncRequest::Pull {
            since: state.pull_cursor,
        };
        match self.transport.send_request(&self.address, &request).await? {
            SyncResponse::Changes { records, cursor } => {
                if cursor < state.pull_cursor {
                    info!(
                        cursor,
                        ours = state.pull_cursor,
                        "Peer cursor went backwards, resyncing"
                    );
                    state.connected = false;
                    state.remote_epoch = None;
                    state.push_cursor = 0;
                    state.pull_cursor = 0;
                    return Ok(());
                }
                self.store.merge(records)?;
                state.pull_cursor = cursor;
            }
            other => return Err(unexpected("Changes", &other)),
        }
        Ok(())
    }

    async fn handshake(&self, state: &mut LinkState) -> Result<()> {
        let request = SyncRequest::Hello {
            node_id: self.store.node_id().to_string(),
            version: PROTOCOL_VERSION,
        };
        let (remote_id, version, epoch) =
            match self.transport.send_request(&self.address, &request).await? {
                SyncResponse::Hello {
                    node_id,
                    version,
                    epoch,
                } => (node_id, version, epoch),
                other => return Err(unexpected("Hello", &other)),
            };
        if version != PROTOCOL_VERSION {
            return Err(SyncError::ProtocolMismatch {
                expected: PROTOCOL_VERSION,
                received: version,
            }
            .into());
        }

        if state.remote_epoch.as_deref() != Some(epoch.as_str()) {
            if state.remote_epoch.is_some() {
                info!(remote = %remote_id, "Peer restarted, resyncing from scratch");
            }
            state.push_cursor = 0;
            state.pull_cursor = 0;
        }
        info!(remote = %remote_id, "Connected to peer");
        state.remote_epoch = Some(epoch);
        state.connected = true;
        Ok(())
    }
}

fn unexpected(expected: &'static str, actual: &SyncResponse) -> crate::Error {
    SyncError::UnexpectedResponse {
        expected,
        actual: format!("{actual:?}"),
    }
    .into()
}
