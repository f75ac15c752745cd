use std::{sync::Arc, time::Duration};

use parley::{FixedClock, Node, NodeConfig};

/// Link interval used by tests so replication settles quickly.
pub const TEST_SYNC_INTERVAL: Duration = Duration::from_millis(50);

/// How long tests wait for replication before failing.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Config for a test node with a fixed id and a fast link interval.
pub fn test_config(node_id: &str) -> NodeConfig {
    NodeConfig::default()
        .with_node_id(node_id)
        .with_sync_interval(TEST_SYNC_INTERVAL)
}

/// Creates a node that is not serving.
pub async fn test_node(node_id: &str) -> Node {
    Node::open(test_config(node_id))
        .await
        .expect("Failed to open test node")
}

/// Creates a node driven by a [`FixedClock`].
pub async fn test_node_with_clock(node_id: &str, clock: Arc<FixedClock>) -> Node {
    Node::open(test_config(node_id).with_clock(clock))
        .await
        .expect("Failed to open test node")
}

/// Creates a node serving on a free local port. Returns the bound address.
pub async fn serving_node(node_id: &str) -> (Node, String) {
    let node = test_node(node_id).await;
    let address = node
        .serve("127.0.0.1:0")
        .await
        .expect("Failed to start sync server");
    (node, address)
}

/// Poll `condition` until it holds or [`SETTLE_TIMEOUT`] passes.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Wait until `node` holds `expected` under `key`.
pub async fn wait_for_value(node: &Node, key: &str, expected: &str) {
    let reached = wait_until(|| node.get(key).as_deref() == Some(expected)).await;
    assert!(
        reached,
        "node {} never saw {key} = {expected}, has {:?}",
        node.id(),
        node.get(key)
    );
}
