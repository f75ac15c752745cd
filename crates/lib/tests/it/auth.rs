use crate::helpers::{serving_node, test_node, wait_until};

#[tokio::test]
async fn login_updates_session_watchers() {
    let node = test_node("auth-a").await;
    let mut rx = node.watch_auth();
    assert!(!rx.borrow().is_authenticated());

    node.login("alice", "pw").await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().username.as_deref(), Some("alice"));
    assert_eq!(node.auth().username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn wrong_password_is_rejected_after_registration() {
    let node = test_node("auth-b").await;
    node.login("alice", "right").await.unwrap();
    node.logout();

    let err = node.login("alice", "wrong").await.unwrap_err();
    assert!(err.is_invalid_credentials());
    assert!(!node.auth().is_authenticated());

    node.login("alice", "right").await.unwrap();
    assert!(node.auth().is_authenticated());
}

#[tokio::test]
async fn accounts_replicate_to_peers() {
    let (server, address) = serving_node("auth-server").await;
    let client = test_node("auth-client").await;
    client.dial(&address).unwrap();

    client.login("bob", "hunter2").await.unwrap();
    assert!(wait_until(|| server.get("auth.users.bob").is_some()).await);

    let err = server.login("bob", "nope").await.unwrap_err();
    assert!(err.is_invalid_credentials());
    server.login("bob", "hunter2").await.unwrap();
}
