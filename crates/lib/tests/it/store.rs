use std::sync::Arc;

use parley::{
    FixedClock, Node,
    store::{Record, Store},
};

use crate::helpers::{test_config, test_node_with_clock};

#[tokio::test]
async fn data_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parley.json");

    let node = Node::open(test_config("persist").with_data_file(&path))
        .await
        .unwrap();
    node.put("my.messages.1", r#"{"text":"hi","username":"a"}"#)
        .unwrap();
    node.put("my.messages.2", r#"{"text":"yo","username":"b"}"#)
        .unwrap();
    node.shutdown().await.unwrap();
    assert!(path.exists());

    let reopened = Node::open(test_config("persist").with_data_file(&path))
        .await
        .unwrap();
    assert_eq!(reopened.keys("my.messages"), vec!["1", "2"]);
    assert_eq!(
        reopened.get("my.messages.2").as_deref(),
        Some(r#"{"text":"yo","username":"b"}"#)
    );
}

#[tokio::test]
async fn missing_data_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let node = Node::open(test_config("fresh").with_data_file(dir.path().join("none.json")))
        .await
        .unwrap();
    assert!(node.store().is_empty());
}

#[test]
fn corrupt_data_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, b"not json").unwrap();
    let err = Store::load_from_file(&path, "n", Arc::new(FixedClock::default())).unwrap_err();
    assert!(err.is_io_error());
    assert_eq!(err.module(), "store");
}

#[test]
fn future_file_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v9.json");
    std::fs::write(&path, br#"{"_v": 9, "records": {}}"#).unwrap();
    let err = Store::load_from_file(&path, "n", Arc::new(FixedClock::default())).unwrap_err();
    assert!(err.is_io_error());
}

#[tokio::test]
async fn same_millisecond_messages_collide() {
    let clock = Arc::new(FixedClock::frozen(1_700_000_000_000));
    let node = test_node_with_clock("collide", clock.clone()).await;
    let key = format!("my.messages.{}", clock.get());
    node.put(key.clone(), "first").unwrap();
    node.put(key.clone(), "second").unwrap();
    assert_eq!(node.keys("my.messages").len(), 1);
    assert_eq!(node.get(&key).as_deref(), Some("second"));
}

#[tokio::test]
async fn key_watch_follows_remote_merges() {
    let node = crate::helpers::test_node("watcher").await;
    let mut keys = node.watch_keys("my.messages");
    let writer = node.store().clone();
    let task = tokio::spawn(async move {
        writer
            .merge([(
                "my.messages.5".to_string(),
                Record::new("{}", 5, "elsewhere"),
            )])
            .unwrap();
    });
    let latest = keys.changed().await.unwrap();
    task.await.unwrap();
    assert_eq!(latest, vec!["5"]);
}
