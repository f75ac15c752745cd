//! Node configuration.

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    Clock, SystemClock, constants::DEFAULT_SYNC_INTERVAL,
    sync::transports::http::DEFAULT_REQUEST_TIMEOUT,
};

/// Options for [`Node::open`](super::Node::open).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Stable node id. A random UUID is used when unset.
    pub node_id: Option<String>,
    /// JSON file the store is loaded from on open and saved to on `save()`.
    pub data_file: Option<PathBuf>,
    /// Interval between link rounds when nothing changes locally.
    pub sync_interval: Duration,
    /// Timeout for each sync request.
    pub request_timeout: Duration,
    /// Time source for record timestamps.
    pub clock: Arc<dyn Clock>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            data_file: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }
}

impl NodeConfig {
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
