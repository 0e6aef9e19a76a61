//! End-to-end tests for the relay server.
//!
//! These tests start a real server on a random port, create channels over
//! HTTP and join them with WebSocket clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use whisp_relay::{ChannelId, ChannelRegistry, RelayServer, ServerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a server on a random port
async fn start_server(config: ServerConfig) -> (SocketAddr, Arc<ChannelRegistry>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = RelayServer::new(config.bind(addr));
    let registry = Arc::clone(server.registry());

    tokio::spawn(async move {
        server
            .serve(listener, std::future::pending())
            .await
            .expect("server failed");
    });

    (addr, registry)
}

/// Create a channel through the HTTP API
async fn create_channel(addr: SocketAddr, password: &str) -> String {
    let response = reqwest::Client::new()
        .post(format!("http://{}/channel", addr))
        .json(&serde_json::json!({ "password": password }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["channel_id"].as_str().unwrap().to_string()
}

fn join_url(addr: SocketAddr, channel_id: &str, password: &str) -> String {
    format!("ws://{}/channel/{}?password={}", addr, channel_id, password)
}

async fn join(addr: SocketAddr, channel_id: &str, password: &str) -> Client {
    let (stream, _response) = tokio_tungstenite::connect_async(join_url(addr, channel_id, password))
        .await
        .expect("Failed to join channel");
    stream
}

/// Join and return the HTTP status of the refused handshake
async fn join_status(addr: SocketAddr, channel_id: &str, password: &str) -> u16 {
    let err = tokio_tungstenite::connect_async(join_url(addr, channel_id, password))
        .await
        .err()
        .expect("join should have been refused");

    match err {
        WsError::Http(response) => response.status().as_u16(),
        other => panic!("Expected HTTP error, got {}", other),
    }
}

/// Wait until the channel has exactly `count` members
async fn wait_for_members(registry: &ChannelRegistry, channel_id: &str, count: usize) {
    let channel = registry.lookup(&ChannelId::new(channel_id)).await.unwrap();

    timeout(TIMEOUT, async {
        while channel.member_count().await != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timed out waiting for membership");
}

async fn recv_text(client: &mut Client) -> String {
    let message = timeout(TIMEOUT, client.next())
        .await
        .expect("Timed out waiting for message")
        .expect("Stream ended")
        .expect("WebSocket error");

    match message {
        Message::Text(text) => text.to_string(),
        other => panic!("Expected Text frame, got {:?}", other),
    }
}

async fn assert_silent(client: &mut Client) {
    if let Ok(Some(message)) = timeout(QUIET, client.next()).await {
        panic!("Expected no message, got {:?}", message);
    }
}

#[tokio::test]
async fn test_scenario() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let x = create_channel(addr, "secret").await;

    let mut a = join(addr, &x, "secret").await;
    let mut b = join(addr, &x, "secret").await;
    wait_for_members(&registry, &x, 2).await;

    assert_eq!(join_status(addr, &x, "wrong").await, 401);
    assert_eq!(registry.stats().await.total_members, 2);

    a.send(Message::Text("hello".into())).await.unwrap();
    assert_eq!(recv_text(&mut b).await, "hello");
    assert_silent(&mut a).await;

    b.close(None).await.unwrap();
    wait_for_members(&registry, &x, 1).await;

    a.send(Message::Text("hi".into())).await.unwrap();
    assert_silent(&mut a).await;

    // Sender's session is still alive
    let mut c = join(addr, &x, "secret").await;
    wait_for_members(&registry, &x, 2).await;
    c.send(Message::Text("still here".into())).await.unwrap();
    assert_eq!(recv_text(&mut a).await, "still here");
}

#[tokio::test]
async fn test_broadcast_reaches_all_others() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let id = create_channel(addr, "pw").await;

    let mut a = join(addr, &id, "pw").await;
    let mut b = join(addr, &id, "pw").await;
    let mut c = join(addr, &id, "pw").await;
    wait_for_members(&registry, &id, 3).await;

    a.send(Message::Text("P".into())).await.unwrap();

    assert_eq!(recv_text(&mut b).await, "P");
    assert_eq!(recv_text(&mut c).await, "P");
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_channels_are_isolated() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let first = create_channel(addr, "pw").await;
    let second = create_channel(addr, "pw").await;
    assert_ne!(first, second);

    let mut a = join(addr, &first, "pw").await;
    let mut b = join(addr, &first, "pw").await;
    let mut other = join(addr, &second, "pw").await;
    wait_for_members(&registry, &first, 2).await;
    wait_for_members(&registry, &second, 1).await;

    a.send(Message::Text("only first".into())).await.unwrap();
    assert_eq!(recv_text(&mut b).await, "only first");
    assert_silent(&mut other).await;
}

#[tokio::test]
async fn test_binary_frames_relayed_unmodified() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let id = create_channel(addr, "").await;

    let mut a = join(addr, &id, "").await;
    let mut b = join(addr, &id, "").await;
    wait_for_members(&registry, &id, 2).await;

    let payload = vec![0u8, 255, 1, 254];
    a.send(Message::Binary(payload.clone().into())).await.unwrap();

    let message = timeout(TIMEOUT, b.next()).await.unwrap().unwrap().unwrap();
    match message {
        Message::Binary(data) => assert_eq!(data.to_vec(), payload),
        other => panic!("Expected Binary frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sender_order_preserved() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let id = create_channel(addr, "pw").await;

    let mut a = join(addr, &id, "pw").await;
    let mut b = join(addr, &id, "pw").await;
    wait_for_members(&registry, &id, 2).await;

    for i in 0..20 {
        a.send(Message::Text(i.to_string().into())).await.unwrap();
    }
    for i in 0..20 {
        assert_eq!(recv_text(&mut b).await, i.to_string());
    }
}

#[tokio::test]
async fn test_unknown_channel_rejected() {
    let (addr, _registry) = start_server(ServerConfig::default()).await;

    assert_eq!(join_status(addr, "no-such-channel", "secret").await, 401);
}

#[tokio::test]
async fn test_rejections_are_indistinguishable() {
    let (addr, _registry) = start_server(ServerConfig::default()).await;
    let id = create_channel(addr, "secret").await;
    let client = reqwest::Client::new();

    let wrong = client
        .get(format!("http://{}/channel/{}?password=wrong", addr, id))
        .send()
        .await
        .unwrap();
    let missing = client
        .get(format!("http://{}/channel/missing?password=secret", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong.status(), 401);
    assert_eq!(missing.status(), 401);
    assert_eq!(wrong.text().await.unwrap(), missing.text().await.unwrap());
}

#[tokio::test]
async fn test_malformed_create_is_bad_request() {
    let (addr, registry) = start_server(ServerConfig::default()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/channel", addr))
        .header("content-type", "application/json")
        .body("{\"pass")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(registry.channel_count().await, 0);
}

#[tokio::test]
async fn test_connection_limit() {
    let (addr, registry) = start_server(ServerConfig::default().max_connections(1)).await;
    let id = create_channel(addr, "pw").await;

    let mut first = join(addr, &id, "pw").await;
    wait_for_members(&registry, &id, 1).await;
    assert_eq!(join_status(addr, &id, "pw").await, 503);

    first.close(None).await.unwrap();
    wait_for_members(&registry, &id, 0).await;

    // Slot is released once the session has fully closed
    timeout(TIMEOUT, async {
        loop {
            if let Ok((_stream, _)) =
                tokio_tungstenite::connect_async(join_url(addr, &id, "pw")).await
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("slot was never released");
}

#[tokio::test]
async fn test_health_reports_counts() {
    let (addr, registry) = start_server(ServerConfig::default()).await;
    let id = create_channel(addr, "pw").await;
    let _a = join(addr, &id, "pw").await;
    wait_for_members(&registry, &id, 1).await;

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["channels"], 1);
    assert_eq!(body["members"], 1);
    assert_eq!(body["active_sessions"], 1);
}
