use std::sync::Arc;

use parley::{
    FixedClock,
    store::{Record, Store},
    sync::{
        handler::{StoreSyncHandler, SyncHandler},
        protocol::{PROTOCOL_VERSION, SyncRequest, SyncResponse},
        transports::{SyncTransport, http::HttpTransport},
    },
};

fn test_handler() -> (Store, Arc<dyn SyncHandler>) {
    let store = Store::new("server", Arc::new(FixedClock::default()));
    let handler: Arc<dyn SyncHandler> = Arc::new(StoreSyncHandler::new(store.clone()));
    (store, handler)
}

#[tokio::test]
async fn test_http_transport_server_lifecycle() {
    let transport = HttpTransport::new().unwrap();
    assert_eq!(transport.transport_type(), "http");
    assert!(!transport.is_server_running());

    let (_store, handler) = test_handler();
    transport.start_server("127.0.0.1:0", handler).await.unwrap();
    assert!(transport.is_server_running());
    let address = transport.get_server_address().unwrap();
    assert!(address.starts_with("127.0.0.1:"));
    assert!(!address.ends_with(":0"));

    transport.stop_server().await.unwrap();
    assert!(!transport.is_server_running());
}

#[tokio::test]
async fn test_http_transport_double_start_error() {
    let transport = HttpTransport::new().unwrap();
    let (_store, handler) = test_handler();
    transport
        .start_server("127.0.0.1:0", handler.clone())
        .await
        .unwrap();

    let result = transport.start_server("127.0.0.1:0", handler).await;
    assert!(result.is_err());

    transport.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_http_transport_stop_without_start() {
    let transport = HttpTransport::new().unwrap();
    assert!(transport.stop_server().await.is_err());
}

#[tokio::test]
async fn test_http_transport_bad_bind_address() {
    let transport = HttpTransport::new().unwrap();
    let (_store, handler) = test_handler();
    let err = transport
        .start_server("not-an-address", handler)
        .await
        .unwrap_err();
    assert_eq!(err.module(), "sync");
}

#[tokio::test]
async fn test_http_transport_client_server_communication() {
    let server = HttpTransport::new().unwrap();
    let client = HttpTransport::new().unwrap();
    let (store, handler) = test_handler();
    server.start_server("127.0.0.1:0", handler).await.unwrap();
    let address = server.get_server_address().unwrap();

    let hello = client
        .send_request(
            &address,
            &SyncRequest::Hello {
                node_id: "client".into(),
                version: PROTOCOL_VERSION,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        hello,
        SyncResponse::Hello {
            node_id: "server".into(),
            version: PROTOCOL_VERSION,
            epoch: store.epoch().to_string(),
        }
    );

    let pushed = client
        .send_request(
            &address,
            &SyncRequest::Push {
                from: "client".into(),
                records: vec![
                    ("my.messages.1".into(), Record::new("a", 1, "client")),
                    ("my.messages.2".into(), Record::new("b", 2, "client")),
                ],
            },
        )
        .await
        .unwrap();
    assert_eq!(pushed, SyncResponse::Merged(2));
    assert_eq!(store.keys("my.messages"), vec!["1", "2"]);

    let pulled = client
        .send_request(&address, &SyncRequest::Pull { since: 1 })
        .await
        .unwrap();
    match pulled {
        SyncResponse::Changes { records, cursor } => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].0, "my.messages.2");
            assert_eq!(cursor, 2);
        }
        other => panic!("Expected Changes, got {other:?}"),
    }

    server.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_http_transport_remote_error_is_mapped() {
    let server = HttpTransport::new().unwrap();
    let client = HttpTransport::new().unwrap();
    let (_store, handler) = test_handler();
    server.start_server("127.0.0.1:0", handler).await.unwrap();
    let address = server.get_server_address().unwrap();

    let err = client
        .send_request(
            &address,
            &SyncRequest::Hello {
                node_id: "client".into(),
                version: PROTOCOL_VERSION + 1,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_protocol_error());

    server.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_http_transport_unreachable_peer() {
    let client = HttpTransport::new().unwrap();
    // Bind and immediately drop a listener to get a port nobody serves.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client
        .send_request(&format!("127.0.0.1:{port}"), &SyncRequest::Pull { since: 0 })
        .await
        .unwrap_err();
    assert!(err.is_network_error());
}
