//! WebSocket round-trip integration tests.
//!
//! Tests real WebSocket connections to verify the snapshot stream.

mod common;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use common::TestServer;
use showreel_server::{RateLimitConfig, NOTICE_DOCUMENT_PATH};

/// Helper to receive and parse a JSON message with timeout.
async fn recv_json(
    stream: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> Option<Value> {
    let msg = timeout(Duration::from_secs(5), stream.next())
        .await
        .ok()??
        .ok()?;

    match msg {
        Message::Text(text) => serde_json::from_str(&text).ok(),
        _ => None,
    }
}

/// Helper to send a JSON message.
async fn send_json<S>(sink: &mut S, value: &Value) -> Result<(), String>
where
    S: SinkExt<Message> + Unpin,
{
    let text = serde_json::to_string(value).map_err(|e| e.to_string())?;
    sink.send(Message::Text(text))
        .await
        .map_err(|_| "send failed".to_string())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn connect_and_receive_welcome() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url())
        .await
        .expect("Failed to connect");
    let (_, mut read) = ws_stream.split();

    let msg = recv_json(&mut read).await.expect("No welcome message");
    assert_eq!(msg["type"], "welcome");
    assert!(msg["version"].is_string());
    assert!(msg["timestamp"].is_u64());

    server.shutdown().await;
}

#[tokio::test]
async fn subscribe_returns_current_snapshot() {
    let server = TestServer::start().await;
    server.store().set(
        NOTICE_DOCUMENT_PATH,
        object(json!({"text": "Maintenance tonight", "enabled": true})),
    );

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": NOTICE_DOCUMENT_PATH}))
        .await
        .expect("send");

    let snapshot = recv_json(&mut read).await.expect("snapshot");
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["path"], NOTICE_DOCUMENT_PATH);
    assert_eq!(snapshot["exists"], true);
    assert_eq!(snapshot["data"]["text"], "Maintenance tonight");

    server.shutdown().await;
}

#[tokio::test]
async fn subscribe_to_missing_document_reports_absent() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": "settings/missing"}))
        .await
        .expect("send");

    let snapshot = recv_json(&mut read).await.expect("snapshot");
    assert_eq!(snapshot["type"], "snapshot");
    assert_eq!(snapshot["exists"], false);
    assert!(snapshot.get("data").is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn changes_are_pushed_to_subscribers() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": NOTICE_DOCUMENT_PATH}))
        .await
        .expect("send");
    let initial = recv_json(&mut read).await.expect("initial snapshot");
    assert_eq!(initial["exists"], false);

    server
        .store()
        .merge(NOTICE_DOCUMENT_PATH, object(json!({"enabled": false})))
        .expect("merge");
    let update = recv_json(&mut read).await.expect("update");
    assert_eq!(update["type"], "snapshot");
    assert_eq!(update["data"], json!({"enabled": false}));

    server
        .store()
        .merge(NOTICE_DOCUMENT_PATH, object(json!({"text": "Back online"})))
        .expect("merge");
    let update = recv_json(&mut read).await.expect("second update");
    assert_eq!(update["data"], json!({"enabled": false, "text": "Back online"}));

    server.store().delete(NOTICE_DOCUMENT_PATH);
    let removed = recv_json(&mut read).await.expect("delete snapshot");
    assert_eq!(removed["exists"], false);

    server.shutdown().await;
}

#[tokio::test]
async fn other_paths_are_not_pushed() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": NOTICE_DOCUMENT_PATH}))
        .await
        .expect("send");
    let _initial = recv_json(&mut read).await.expect("initial");

    server.store().set("settings/other", object(json!({"x": 1})));
    server
        .store()
        .set(NOTICE_DOCUMENT_PATH, object(json!({"text": "Mine"})));

    let next = recv_json(&mut read).await.expect("next");
    assert_eq!(next["path"], NOTICE_DOCUMENT_PATH);
    assert_eq!(next["data"]["text"], "Mine");

    server.shutdown().await;
}

#[tokio::test]
async fn unsubscribe_stops_pushes() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": NOTICE_DOCUMENT_PATH}))
        .await
        .expect("send");
    let _initial = recv_json(&mut read).await.expect("initial");

    send_json(&mut write, &json!({"type": "unsubscribe", "path": NOTICE_DOCUMENT_PATH}))
        .await
        .expect("send");
    // Ping round trip orders the unsubscribe before the write below.
    send_json(&mut write, &json!({"type": "ping"})).await.expect("send");
    let pong = recv_json(&mut read).await.expect("pong");
    assert_eq!(pong["type"], "pong");

    server
        .store()
        .set(NOTICE_DOCUMENT_PATH, object(json!({"text": "Unseen"})));

    send_json(&mut write, &json!({"type": "ping"})).await.expect("send");
    let next = recv_json(&mut read).await.expect("second pong");
    assert_eq!(next["type"], "pong");

    server.shutdown().await;
}

#[tokio::test]
async fn ping_pong() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "ping"})).await.expect("send");
    let pong = recv_json(&mut read).await.expect("pong");
    assert_eq!(pong["type"], "pong");
    assert!(pong["timestamp"].is_u64());

    server.shutdown().await;
}

#[tokio::test]
async fn invalid_path_returns_error() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    send_json(&mut write, &json!({"type": "subscribe", "path": "../etc/passwd"}))
        .await
        .expect("send");
    let error = recv_json(&mut read).await.expect("error");
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "validation_error");

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_message_returns_parse_error() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    write
        .send(Message::Text("not json".to_string()))
        .await
        .expect("send");
    let error = recv_json(&mut read).await.expect("error");
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "parse_error");

    server.shutdown().await;
}

#[tokio::test]
async fn rate_limit_rejects_bursts() {
    let server = TestServer::with_rate_limit(RateLimitConfig {
        burst: 2,
        sustained: 0,
    })
    .await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
    let (mut write, mut read) = ws_stream.split();
    let _welcome = recv_json(&mut read).await.expect("welcome");

    for _ in 0..3 {
        send_json(&mut write, &json!({"type": "ping"})).await.expect("send");
    }
    assert_eq!(recv_json(&mut read).await.expect("pong")["type"], "pong");
    assert_eq!(recv_json(&mut read).await.expect("pong")["type"], "pong");
    let limited = recv_json(&mut read).await.expect("error");
    assert_eq!(limited["type"], "error");
    assert_eq!(limited["code"], "rate_limited");

    server.shutdown().await;
}

#[tokio::test]
async fn multiple_clients_receive_same_change() {
    let server = TestServer::start().await;

    let mut readers = Vec::new();
    let mut writers = Vec::new();
    for _ in 0..2 {
        let (ws_stream, _) = connect_async(&server.ws_url()).await.expect("connect");
        let (mut write, mut read) = ws_stream.split();
        let _welcome = recv_json(&mut read).await.expect("welcome");
        send_json(&mut write, &json!({"type": "subscribe", "path": NOTICE_DOCUMENT_PATH}))
            .await
            .expect("send");
        let _initial = recv_json(&mut read).await.expect("initial");
        readers.push(read);
        writers.push(write);
    }

    server
        .store()
        .set(NOTICE_DOCUMENT_PATH, object(json!({"text": "Everyone"})));

    for read in &mut readers {
        let update = recv_json(read).await.expect("update");
        assert_eq!(update["data"]["text"], "Everyone");
    }

    server.shutdown().await;
}
