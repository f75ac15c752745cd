//! Replication between nodes over real HTTP links.

use std::time::Duration;

use parley::Node;

use crate::helpers::{SETTLE_TIMEOUT, serving_node, test_node, wait_for_value};

/// Serve `node` on `address`, retrying while the previous listener winds down.
async fn serve_again(node: &Node, address: &str) {
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    loop {
        match node.serve(address).await {
            Ok(_) => return,
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => panic!("could not serve on {address} again: {e}"),
        }
    }
}

#[tokio::test]
async fn dialer_and_server_converge_both_ways() {
    let (server, address) = serving_node("repl-server").await;
    let client = test_node("repl-client").await;
    client.dial(&address).unwrap();

    client.put("my.messages.1", "from client").unwrap();
    wait_for_value(&server, "my.messages.1", "from client").await;

    server.put("my.messages.2", "from server").unwrap();
    wait_for_value(&client, "my.messages.2", "from server").await;
}

#[tokio::test]
async fn existing_records_are_sent_on_connect() {
    let (server, address) = serving_node("repl-late-server").await;
    server.put("history.1", "before").unwrap();

    let client = test_node("repl-late-client").await;
    client.put("history.2", "also before").unwrap();
    client.dial(&address).unwrap();

    wait_for_value(&client, "history.1", "before").await;
    wait_for_value(&server, "history.2", "also before").await;
}

#[tokio::test]
async fn edits_replicate_as_overwrites() {
    let (server, address) = serving_node("repl-edit-server").await;
    let client = test_node("repl-edit-client").await;
    client.dial(&address).unwrap();

    client.put("my.messages.9", "draft").unwrap();
    wait_for_value(&server, "my.messages.9", "draft").await;

    server.put("my.messages.9", "edited").unwrap();
    wait_for_value(&client, "my.messages.9", "edited").await;
    assert_eq!(client.keys("my.messages"), vec!["9"]);
}

#[tokio::test]
async fn messages_relay_across_peers() {
    // client a -> peer 0 -> peer 1 <- client b
    let (peer0, addr0) = serving_node("relay-peer-0").await;
    let (_peer1, addr1) = serving_node("relay-peer-1").await;
    peer0.dial(&addr1).unwrap();

    let a = test_node("relay-client-a").await;
    let b = test_node("relay-client-b").await;
    a.dial(&addr0).unwrap();
    b.dial(&addr1).unwrap();

    a.put("my.messages.1", "hello from a").unwrap();
    wait_for_value(&b, "my.messages.1", "hello from a").await;

    b.put("my.messages.2", "hello from b").unwrap();
    wait_for_value(&a, "my.messages.2", "hello from b").await;
}

#[tokio::test]
async fn link_recovers_when_peer_starts_late() {
    // Reserve a port, then release it so the first rounds fail.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let address = format!("127.0.0.1:{port}");

    let client = test_node("late-client").await;
    client.put("k.1", "queued").unwrap();
    client.dial(&address).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let server = test_node("late-server").await;
    server.serve(&address).await.unwrap();
    wait_for_value(&server, "k.1", "queued").await;
}

#[tokio::test]
async fn disconnect_stops_replication() {
    let (server, address) = serving_node("repl-stop-server").await;
    let client = test_node("repl-stop-client").await;
    client.dial(&address).unwrap();
    client.put("a.1", "x").unwrap();
    wait_for_value(&server, "a.1", "x").await;

    client.disconnect(&address).await.unwrap();
    client.put("a.2", "y").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.get("a.2"), None);
}

#[tokio::test]
async fn link_resyncs_with_peer_restarted_under_same_id() {
    let (server, address) = serving_node("restart-peer").await;
    let client = test_node("restart-client").await;
    client.dial(&address).unwrap();
    for i in 1..=5 {
        client
            .put(format!("my.messages.{i}"), format!("message {i}"))
            .unwrap();
    }
    wait_for_value(&server, "my.messages.5", "message 5").await;

    // Same id and address, empty store.
    server.shutdown().await.unwrap();
    drop(server);
    let restarted = test_node("restart-peer").await;
    serve_again(&restarted, &address).await;
    restarted.put("my.messages.100", "after restart").unwrap();

    wait_for_value(&client, "my.messages.100", "after restart").await;
    wait_for_value(&restarted, "my.messages.1", "message 1").await;
    wait_for_value(&restarted, "my.messages.5", "message 5").await;
}
