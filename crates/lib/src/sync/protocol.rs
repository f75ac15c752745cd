//! Protocol definitions for sync communication.
//!
//! Messages are transport-agnostic; the HTTP transport carries them as JSON
//! bodies on a single endpoint.

use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Version spoken by this build. Peers with a different version are refused.
pub const PROTOCOL_VERSION: u32 = 0;

/// Request messages that can be sent to a sync peer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SyncRequest {
    /// Identify ourselves and learn the peer's node id.
    Hello { node_id: String, version: u32 },
    /// Offer records for the peer to merge.
    Push {
        from: String,
        records: Vec<(String, Record)>,
    },
    /// Ask for every record the peer accepted after `since`.
    Pull { since: u64 },
}

/// Response messages returned from a sync peer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SyncResponse {
    /// `epoch` is fresh every time the peer's store is created, so a
    /// restarted peer is told apart from one that kept its sequence numbers.
    Hello {
        node_id: String,
        version: u32,
        epoch: String,
    },
    /// Number of pushed records the peer accepted.
    Merged(usize),
    /// Records newer than the requested cursor, and the cursor to use next.
    Changes {
        records: Vec<(String, Record)>,
        cursor: u64,
    },
    Error(String),
}
