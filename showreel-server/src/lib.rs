//! # Showreel Server Library
//!
//! Remote document store for Showreel clients: HTTP document CRUD and a
//! WebSocket snapshot stream. Used by both the binary and integration tests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use serde_json::{Map, Value};

pub mod health;
pub mod metrics;
pub mod routes;
pub mod store;
pub mod sync;
pub mod validation;

pub use store::{DocumentStore, StoreError};
pub use sync::{handle_sync_socket, RateLimitConfig};

/// Default port for the showreel server.
pub const DEFAULT_PORT: u16 = 9474;

/// Path of the notice document seeded at startup.
pub use showreel_core::notice::NOTICE_DOCUMENT_PATH;

/// Command-line arguments for showreel-server.
#[derive(Parser, Debug, Clone)]
#[command(name = "showreel-server")]
#[command(about = "Remote document store and snapshot stream for Showreel")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on.
    #[arg(long, env = "SHOWREEL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, env = "SHOWREEL_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for persisted documents; in-memory only when unset.
    #[arg(long, env = "SHOWREEL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON object written to the notice document if it does not exist yet.
    #[arg(long, env = "SHOWREEL_SEED_NOTICE")]
    pub seed_notice: Option<String>,

    /// WebSocket burst limit (messages).
    #[arg(
        long,
        env = "SHOWREEL_WS_RATE_BURST",
        default_value_t = sync::DEFAULT_RATE_LIMIT_BURST
    )]
    pub ws_rate_burst: u32,

    /// WebSocket sustained limit (messages per second).
    #[arg(
        long,
        env = "SHOWREEL_WS_RATE_SUSTAINED",
        default_value_t = sync::DEFAULT_RATE_LIMIT_SUSTAINED
    )]
    pub ws_rate_sustained: u32,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// Persistence directory.
    pub data_dir: Option<PathBuf>,
    /// Seed for the notice document.
    pub seed_notice: Option<String>,
    /// Per-connection WebSocket rate limit.
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_dir: None,
            seed_notice: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            addr: SocketAddr::new(args.bind, args.port),
            data_dir: args.data_dir,
            seed_notice: args.seed_notice,
            rate_limit: RateLimitConfig {
                burst: args.ws_rate_burst,
                sustained: args.ws_rate_sustained,
            },
        }
    }
}

/// Shared application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Document storage.
    pub store: DocumentStore,
    /// Per-connection WebSocket rate limit.
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    /// Build state from configuration, opening persistence if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be opened.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let store = match &config.data_dir {
            Some(dir) => DocumentStore::with_data_dir(dir)?,
            None => DocumentStore::new(),
        };
        Ok(Self {
            store,
            rate_limit: config.rate_limit,
        })
    }
}

/// Write `json` to `path` unless a document already exists there.
///
/// Returns whether the seed was written.
///
/// # Errors
///
/// Returns an error if `json` is not a JSON object.
pub fn seed_document(
    store: &DocumentStore,
    path: &str,
    json: &str,
) -> Result<bool, serde_json::Error> {
    let data: Map<String, Value> = serde_json::from_str(json)?;
    if store.get(path).is_some() {
        tracing::debug!("Document {} exists, seed skipped", path);
        return Ok(false);
    }
    store.set(path, data);
    tracing::info!("Seeded document {}", path);
    Ok(true)
}

/// Build the application router (without middleware layers).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/ws", get(websocket_handler))
        .route("/api/documents", get(routes::list_documents))
        .route(
            "/api/documents/{*path}",
            get(routes::get_document)
                .put(routes::put_document)
                .patch(routes::patch_document)
                .delete(routes::delete_document),
        )
        .with_state(state)
}

/// WebSocket upgrade for the snapshot stream.
#[tracing::instrument(name = "websocket_connect", skip(ws, state))]
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_sync_socket(socket, state.store, state.rate_limit))
}
