use parley::testnet::{TestNetwork, TestNetworkConfig};

use crate::helpers::{test_config, test_node, wait_for_value};

fn free_port_config(topology: Vec<Vec<usize>>) -> TestNetworkConfig {
    TestNetworkConfig {
        topology,
        port_base: 0,
        node: test_config("unused"),
        ..TestNetworkConfig::default()
    }
}

#[tokio::test]
async fn default_topology_links_peer_zero_to_peer_one() {
    let network = TestNetwork::start(free_port_config(vec![vec![1], vec![]]))
        .await
        .unwrap();
    assert_eq!(network.len(), 2);

    let peer0 = network.node(0).unwrap();
    let peer1 = network.node(1).unwrap();
    assert_eq!(peer0.id(), "peer-0");
    assert_eq!(peer0.peers(), vec![network.addresses()[1].clone()]);
    assert!(peer1.peers().is_empty());

    peer1.put("my.messages.1", "seeded").unwrap();
    wait_for_value(peer0, "my.messages.1", "seeded").await;

    network.shutdown().await.unwrap();
}

#[tokio::test]
async fn clients_on_different_peers_chat() {
    let network = TestNetwork::start(free_port_config(vec![vec![1], vec![]]))
        .await
        .unwrap();

    let alice = test_node("client-0").await;
    let bob = test_node("client-1").await;
    alice.dial(&network.addresses()[0]).unwrap();
    bob.dial(&network.addresses()[1]).unwrap();

    alice
        .put("my.messages.1", r#"{"text":"hi bob","username":"alice"}"#)
        .unwrap();
    wait_for_value(&bob, "my.messages.1", r#"{"text":"hi bob","username":"alice"}"#).await;

    network.shutdown().await.unwrap();
}

#[tokio::test]
async fn topology_pointing_outside_is_rejected() {
    let err = TestNetwork::start(free_port_config(vec![vec![2], vec![]]))
        .await
        .unwrap_err();
    assert_eq!(err.module(), "sync");
}
