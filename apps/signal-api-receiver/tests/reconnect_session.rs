//! Receive Session Integration Tests
//!
//! Runs the streaming client against a local WebSocket server that pushes
//! batches of frames and then hangs up.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use signal_api_receiver::{
    Message, ReceiveError, ReconnectConfig, ReconnectSupervisor, StreamingClient,
    StreamingClientConfig,
};

/// How the server ends each connection.
#[derive(Clone, Copy)]
enum Hangup {
    Close,
    Drop,
}

/// Serve one batch of frames per accepted connection, then hang up.
async fn spawn_server(batches: Vec<Vec<String>>, hangup: Hangup) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        for batch in batches {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            for frame in batch {
                ws.send(WsMessage::text(frame)).await.unwrap();
            }

            match hangup {
                Hangup::Close => {
                    ws.close(None).await.unwrap();
                    while let Some(Ok(_)) = ws.next().await {}
                }
                Hangup::Drop => drop(ws),
            }
        }
    });

    (addr, handle)
}

fn data_frame(account: &str) -> String {
    serde_json::to_string(&Message::text(account, "hello")).unwrap()
}

fn noise() -> Vec<String> {
    vec![
        r#"{"envelope":{"typingMessage":{"action":"STARTED","timestamp":1}},"account":"+1"}"#.to_string(),
        r#"{"envelope":{"receiptMessage":{"when":1,"isDelivery":true,"timestamps":[1]}},"account":"+1"}"#
            .to_string(),
        "not json at all".to_string(),
        r#"{"envelope":{"dataMessage":{"message":null}},"account":"+1"}"#.to_string(),
    ]
}

fn endpoint(addr: SocketAddr) -> StreamingClientConfig {
    StreamingClientConfig::new(format!("ws://{addr}/v1/receive/+15550000000"))
}

#[tokio::test]
async fn buffers_data_messages_across_reconnects() {
    let first: Vec<String> = ["0", "1", "2"]
        .iter()
        .map(|a| data_frame(a))
        .zip(noise())
        .flat_map(|(data, noise)| [noise, data])
        .collect();
    let second = vec![data_frame("a")];

    let (addr, server) = spawn_server(vec![first, second], Hangup::Close).await;
    let client = StreamingClient::connected(endpoint(addr)).await.unwrap();

    let error = timeout(Duration::from_secs(5), client.receive_loop()).await.unwrap();
    assert!(matches!(error, ReceiveError::Closed(_)), "got {error:?}");

    for account in ["0", "1", "2"] {
        let message = client.pop().unwrap();
        assert_eq!(message.account, account);
        assert_eq!(message.body(), Some("hello"));
    }
    assert!(client.pop().is_none());

    client.connect().await.unwrap();
    timeout(Duration::from_secs(5), client.receive_loop()).await.unwrap();

    assert_eq!(client.pop().unwrap().account, "a");
    assert!(client.pop().is_none());

    server.await.unwrap();
}

#[tokio::test]
async fn dropped_connection_ends_the_loop() {
    let (addr, server) = spawn_server(vec![vec![data_frame("0")]], Hangup::Drop).await;
    let client = StreamingClient::connected(endpoint(addr)).await.unwrap();

    let error = timeout(Duration::from_secs(5), client.receive_loop()).await.unwrap();
    assert!(!matches!(error, ReceiveError::NotConnected), "got {error:?}");

    // the connection is gone until the next connect
    assert!(matches!(client.receive_loop().await, ReceiveError::NotConnected));
    assert_eq!(client.flush().len(), 1);

    server.await.unwrap();
}

#[tokio::test]
async fn supervisor_keeps_the_buffer_filled() {
    let batches = vec![
        vec![data_frame("0"), data_frame("1")],
        vec![data_frame("2")],
        vec![data_frame("3")],
    ];
    let (addr, _server) = spawn_server(batches, Hangup::Close).await;

    let client = Arc::new(StreamingClient::connected(endpoint(addr)).await.unwrap());
    let supervisor = ReconnectSupervisor::new(
        Arc::clone(&client),
        ReconnectConfig::new(Duration::from_millis(10)),
    );
    let task = tokio::spawn(supervisor.run());

    let mut received = Vec::new();
    timeout(Duration::from_secs(5), async {
        while received.len() < 4 {
            received.extend(client.flush().into_iter().map(|m| m.account));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(received, vec!["0", "1", "2", "3"]);
    task.abort();
}

#[tokio::test]
async fn first_connect_failure_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(StreamingClient::connected(endpoint(addr)).await.is_err());
}
