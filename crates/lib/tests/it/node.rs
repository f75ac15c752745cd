use crate::helpers::{serving_node, test_node};

#[tokio::test]
async fn put_get_keys() {
    let node = test_node("facade").await;
    node.put("my.messages.100", "a").unwrap();
    node.put("my.messages.200", "b").unwrap();
    node.put("auth.users.x", "{}").unwrap();

    assert_eq!(node.get("my.messages.100").as_deref(), Some("a"));
    assert_eq!(node.keys("my.messages"), vec!["100", "200"]);
    assert_eq!(node.keys("my"), vec!["messages"]);
}

#[tokio::test]
async fn invalid_keys_surface_as_errors() {
    let node = test_node("facade-bad").await;
    let err = node.put("my..messages", "x").unwrap_err();
    assert!(err.is_invalid_key());
}

#[tokio::test]
async fn value_watch_reports_overwrite() {
    let node = test_node("facade-watch").await;
    node.put("my.messages.1", "old").unwrap();
    let mut watch = node.watch_value("my.messages.1");
    assert_eq!(watch.get(), Some("old"));
    node.put("my.messages.1", "new").unwrap();
    assert!(watch.refresh());
    assert_eq!(watch.get(), Some("new"));
}

#[tokio::test]
async fn dialing_twice_keeps_one_link() {
    let (_server, address) = serving_node("facade-server").await;
    let client = test_node("facade-client").await;
    assert!(client.dial(&address).unwrap());
    assert!(!client.dial(&format!("http://{address}")).unwrap());
    assert_eq!(client.peers(), vec![address.clone()]);

    client.disconnect(&address).await.unwrap();
    assert!(client.peers().is_empty());
    let err = client.disconnect(&address).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn serving_twice_fails() {
    let (node, address) = serving_node("facade-double").await;
    assert_eq!(node.server_address(), Some(address));
    assert!(node.serve("127.0.0.1:0").await.is_err());
    node.stop_serving().await.unwrap();
    assert_eq!(node.server_address(), None);
}
