//! Test server harness for integration tests.
//!
//! Provides a way to spin up a real Axum server on a random port
//! for integration testing with WebSocket and HTTP clients.

use std::net::SocketAddr;
use std::path::Path;

use showreel_server::{router, AppState, DocumentStore, RateLimitConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    store: DocumentStore,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new in-memory test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        Self::with_state(AppState::default()).await
    }

    /// Start a test server persisting documents under `dir`.
    #[allow(dead_code)]
    pub async fn with_data_dir(dir: &Path) -> Self {
        let store = DocumentStore::with_data_dir(dir).expect("open data dir");
        Self::with_state(AppState {
            store,
            rate_limit: RateLimitConfig::default(),
        })
        .await
    }

    /// Start a test server with a custom rate limit.
    #[allow(dead_code)]
    pub async fn with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        Self::with_state(AppState {
            store: DocumentStore::new(),
            rate_limit,
        })
        .await
    }

    async fn with_state(state: AppState) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let store = state.store.clone();
        let app = router(state);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            store,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the WebSocket URL for connecting to the server.
    #[allow(dead_code)]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// URL of a document on the HTTP API.
    #[allow(dead_code)]
    pub fn document_url(&self, path: &str) -> String {
        format!("http://{}/api/documents/{path}", self.addr)
    }

    /// Base HTTP URL.
    #[allow(dead_code)]
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Direct access to the document store (for test setup and assertions).
    #[allow(dead_code)]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
