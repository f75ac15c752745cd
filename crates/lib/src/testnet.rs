//! Local multi-peer network for development and tests.
//!
//! Peer `i` serves on `host:port_base + i` and dials the peers listed in row
//! `i` of the topology, so `[[1], []]` starts two peers where peer 0 links to
//! peer 1. Clients pick a peer with a `peer=<digit>` query parameter.

use url::Url;

use tracing::info;

use crate::{
    Node, NodeConfig, Result,
    constants::{DEFAULT_PEER_HOST, DEFAULT_PORT_BASE},
    sync::SyncError,
};

/// Which peers each peer dials, by index.
pub type Topology = Vec<Vec<usize>>;

/// Options for [`TestNetwork::start`].
#[derive(Debug, Clone)]
pub struct TestNetworkConfig {
    pub topology: Topology,
    pub host: String,
    /// Port of peer 0. Zero binds every peer to a free port.
    pub port_base: u16,
    /// Base configuration cloned for every peer.
    pub node: NodeConfig,
}

impl Default for TestNetworkConfig {
    fn default() -> Self {
        Self {
            topology: vec![vec![1], vec![]],
            host: DEFAULT_PEER_HOST.to_string(),
            port_base: DEFAULT_PORT_BASE,
            node: NodeConfig::default(),
        }
    }
}

/// Address of test network peer `index`.
pub fn peer_address(host: &str, port_base: u16, index: u8) -> String {
    format!("{host}:{}", u32::from(port_base) + u32::from(index))
}

/// Peer index selected by a `peer=<digit>` query parameter.
///
/// Only the first character after `peer=` counts and it must be a digit.
/// Accepts a full URL or a bare query string.
pub fn peer_from_url(input: &str) -> Option<u8> {
    let query = match Url::parse(input) {
        Ok(url) => url.query().map(str::to_string),
        Err(_) => Some(input.trim_start_matches('?').to_string()),
    }?;

    let value = url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "peer")
        .map(|(_, value)| value.into_owned())?;
    peer_from_value(&value)
}

/// Peer index from a selector value such as `"1"`. See [`peer_from_url`].
pub fn peer_from_value(value: &str) -> Option<u8> {
    value
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// A running set of peers.
#[derive(Debug)]
pub struct TestNetwork {
    nodes: Vec<Node>,
    addresses: Vec<String>,
}

impl TestNetwork {
    /// Start every peer, then wire up the topology.
    pub async fn start(config: TestNetworkConfig) -> Result<Self> {
        let count = config.topology.len();
        for (from, targets) in config.topology.iter().enumerate() {
            if let Some(bad) = targets.iter().find(|t| **t >= count) {
                return Err(SyncError::InvalidAddress {
                    address: format!("peer {bad}"),
                    reason: format!("peer {from} links to a peer outside the topology"),
                }
                .into());
            }
        }

        let mut nodes = Vec::with_capacity(count);
        let mut addresses = Vec::with_capacity(count);
        for index in 0..count {
            let node_config = config.node.clone().with_node_id(format!("peer-{index}"));
            let node = Node::open(node_config).await?;
            let port = if config.port_base == 0 {
                0
            } else {
                u32::from(config.port_base) + index as u32
            };
            let address = node.serve(&format!("{}:{port}", config.host)).await?;
            info!(peer = index, address = %address, "Test peer started");
            nodes.push(node);
            addresses.push(address);
        }

        for (from, targets) in config.topology.iter().enumerate() {
            for &to in targets {
                nodes[from].dial(&addresses[to])?;
            }
        }

        Ok(Self { nodes, addresses })
    }

    /// Bound address of every peer, by index.
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stop every peer.
    pub async fn shutdown(self) -> Result<()> {
        for node in &self.nodes {
            node.shutdown().await?;
        }
        Ok(())
    }
}
