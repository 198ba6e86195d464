//! # WebSocket Document Synchronization
//!
//! Streams document snapshots to connected clients.
//!
//! ## Message Protocol
//!
//! ### Client -> Server
//!
//! - `{"type": "subscribe", "path": "settings/config"}`
//! - `{"type": "unsubscribe", "path": "settings/config"}`
//! - `{"type": "ping"}`
//!
//! ### Server -> Client
//!
//! - `{"type": "welcome", "version": "...", "timestamp": ...}`
//! - `{"type": "snapshot", "path": "...", "exists": true, "data": {...}}`
//! - `{"type": "pong", "timestamp": ...}`
//! - `{"type": "error", "code": "...", "message": "..."}`
//!
//! A subscribe is answered with the current snapshot of the path, followed
//! by a fresh snapshot after every change. Snapshots always carry the whole
//! document.

use std::collections::HashSet;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use showreel_core::DocumentSnapshot;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::metrics::{
    dec_ws_connections, inc_ws_connections, record_rate_limited, record_snapshot_pushed,
    record_validation_failure, record_ws_message,
};
use crate::store::DocumentStore;
use crate::validation::{validate_document_path, validate_message_size, ValidationError};

/// Default burst capacity for rate limiting (messages).
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 100;
/// Default sustained rate for rate limiting (messages per second).
pub const DEFAULT_RATE_LIMIT_SUSTAINED: u32 = 10;

/// Per-connection rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of messages accepted in a burst.
    pub burst: u32,
    /// Messages per second refilled after a burst.
    pub sustained: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: DEFAULT_RATE_LIMIT_BURST,
            sustained: DEFAULT_RATE_LIMIT_SUSTAINED,
        }
    }
}

/// Token bucket rate limiter for WebSocket connections.
pub struct RateLimiter {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a limiter from its settings.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            tokens: f64::from(config.burst),
            capacity: f64::from(config.burst),
            refill_rate: f64::from(config.sustained),
            last_refill: Instant::now(),
        }
    }

    /// Try to consume one token. Returns false when rate limited.
    pub fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Time until the next token is available, `None` if one is available now.
    #[must_use]
    pub fn time_until_available(&self) -> Option<Duration> {
        if self.tokens >= 1.0 || self.refill_rate <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate))
        }
    }
}

/// Client-to-server WebSocket message types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving snapshots of a document.
    Subscribe {
        /// Document path.
        path: String,
    },
    /// Stop receiving snapshots of a document.
    Unsubscribe {
        /// Document path.
        path: String,
    },
    /// Ping to keep connection alive.
    Ping,
}

impl ClientMessage {
    /// Message type label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Ping => "ping",
        }
    }
}

/// Server-to-client WebSocket message types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome message on connection.
    Welcome {
        /// Server version.
        version: String,
        /// Connection timestamp.
        timestamp: u64,
    },
    /// Whole-document snapshot.
    Snapshot {
        /// Document path.
        path: String,
        /// Whether the document exists.
        exists: bool,
        /// Document fields; absent when the document does not exist.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Map<String, Value>>,
    },
    /// Reply to a ping.
    Pong {
        /// Server timestamp.
        timestamp: u64,
    },
    /// Request failed.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

impl From<DocumentSnapshot> for ServerMessage {
    fn from(snapshot: DocumentSnapshot) -> Self {
        Self::Snapshot {
            exists: snapshot.exists(),
            path: snapshot.path,
            data: snapshot.data,
        }
    }
}

impl ServerMessage {
    fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn validation_error(err: &ValidationError) -> Self {
        Self::error("validation_error", err.to_string())
    }
}

/// Per-connection subscription state.
pub struct ClientConnection {
    peer_id: String,
    store: DocumentStore,
    subscriptions: HashSet<String>,
}

impl ClientConnection {
    /// Create a connection with a generated peer ID.
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        Self {
            peer_id: Uuid::new_v4().to_string(),
            store,
            subscriptions: HashSet::new(),
        }
    }

    /// This connection's peer ID.
    #[must_use]
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Whether the connection is subscribed to `path`.
    #[must_use]
    pub fn is_subscribed(&self, path: &str) -> bool {
        self.subscriptions.contains(path)
    }

    /// Number of subscribed paths.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handle an incoming client message.
    pub fn handle_message(&mut self, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Subscribe { path } => {
                if let Err(e) = validate_document_path(&path) {
                    tracing::warn!("Invalid path from peer {}: {}", self.peer_id, e);
                    record_validation_failure(e.kind());
                    return Some(ServerMessage::validation_error(&e));
                }
                tracing::info!("Peer {} subscribed to {}", self.peer_id, path);
                let snapshot = self.store.snapshot(&path);
                self.subscriptions.insert(path);
                Some(snapshot.into())
            }
            ClientMessage::Unsubscribe { path } => {
                if self.subscriptions.remove(&path) {
                    tracing::info!("Peer {} unsubscribed from {}", self.peer_id, path);
                }
                None
            }
            ClientMessage::Ping => Some(ServerMessage::Pong {
                timestamp: current_timestamp(),
            }),
        }
    }

    /// Message to forward for a store change, if subscribed to its path.
    #[must_use]
    pub fn forward(&self, snapshot: DocumentSnapshot) -> Option<ServerMessage> {
        self.is_subscribed(&snapshot.path).then(|| snapshot.into())
    }
}

async fn send_message<S>(sender: &mut S, message: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle a WebSocket connection.
pub async fn handle_sync_socket(socket: WebSocket, store: DocumentStore, limits: RateLimitConfig) {
    let (mut sender, mut receiver) = socket.split();

    let mut client = ClientConnection::new(store.clone());
    let mut rate_limiter = RateLimiter::new(limits);
    let peer_id = client.peer_id().to_string();

    // Before the first snapshot goes out.
    let mut event_rx = store.subscribe();
    inc_ws_connections();

    let welcome = ServerMessage::Welcome {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: current_timestamp(),
    };
    if !send_message(&mut sender, &welcome).await {
        dec_ws_connections();
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !rate_limiter.try_consume() {
                            tracing::warn!("Rate limit exceeded for peer {}", peer_id);
                            record_rate_limited("websocket");
                            let retry_after = rate_limiter
                                .time_until_available()
                                .map_or(100, |d| d.as_millis().min(10_000));
                            let error = ServerMessage::error(
                                "rate_limited",
                                format!("Rate limit exceeded. Retry after {retry_after}ms"),
                            );
                            if !send_message(&mut sender, &error).await {
                                break;
                            }
                            continue;
                        }

                        if let Err(e) = validate_message_size(text.len()) {
                            tracing::warn!("Message from peer {} rejected: {}", peer_id, e);
                            record_validation_failure(e.kind());
                            let error = ServerMessage::error("message_too_large", e.to_string());
                            if !send_message(&mut sender, &error).await {
                                break;
                            }
                            continue;
                        }

                        tracing::debug!("Received from {}: {}", peer_id, text);

                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                record_ws_message("inbound", client_msg.kind());
                                client.handle_message(client_msg)
                            }
                            Err(e) => Some(ServerMessage::error("parse_error", e.to_string())),
                        };
                        if let Some(reply) = reply {
                            if matches!(reply, ServerMessage::Snapshot { .. }) {
                                record_snapshot_pushed();
                            }
                            if !send_message(&mut sender, &reply).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Peer {} disconnected", peer_id);
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error for peer {}: {}", peer_id, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            event = event_rx.recv() => {
                match event {
                    Ok(snapshot) => {
                        if let Some(message) = client.forward(snapshot) {
                            record_snapshot_pushed();
                            if !send_message(&mut sender, &message).await {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            "WebSocket client {} lagged behind by {} messages",
                            peer_id,
                            n
                        );
                        // Missed changes are replaced by the current state.
                        let paths: Vec<String> = client.subscriptions.iter().cloned().collect();
                        let mut delivered = true;
                        for path in paths {
                            let message = ServerMessage::from(store.snapshot(&path));
                            if !send_message(&mut sender, &message).await {
                                delivered = false;
                                break;
                            }
                        }
                        if !delivered {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }

    dec_ws_connections();
    tracing::info!("WebSocket connection for peer {} closed", peer_id);
}

/// Get the current Unix timestamp in milliseconds.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
