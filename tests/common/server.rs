//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases and its own
//! mock upstream.

use super::constants::*;
use super::upstream::MockUpstream;
use catalog_mirror_server::contact::{ContactService, Mailer, ResendMailer};
use catalog_mirror_server::github::GithubClient;
use catalog_mirror_server::mirror::MirrorService;
use catalog_mirror_server::spotify::{SpotifyAuthClient, SpotifyClient};
use catalog_mirror_server::token_cache::TokenCache;
use catalog_mirror_server::{
    make_app, RequestsLoggingLevel, ServerConfig, SqliteMirrorStore, SqliteStateStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases and a mock upstream
///
/// When dropped, both servers shut down and the temp resources are cleaned
/// up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The mock catalog API, token endpoint and email provider
    pub upstream: MockUpstream,

    /// Path of the state database, for direct inspection in tests
    pub state_db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Spawns the mock upstream
    /// 2. Creates empty mirror and state databases in a temp directory
    /// 3. Wires all clients to the mock upstream
    /// 4. Binds to a random port (127.0.0.1:0)
    /// 5. Spawns the server in a background task
    /// 6. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if any step fails or the server does not become ready within
    /// the timeout.
    pub async fn spawn() -> Self {
        let upstream = MockUpstream::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");
        let mirror_db_path = temp_db_dir.path().join("mirror.db");
        let state_db_path = temp_db_dir.path().join("state.db");

        let mirror_store = Arc::new(
            SqliteMirrorStore::with_read_pool_size(&mirror_db_path, 2)
                .expect("Failed to open mirror store"),
        );
        let state_store =
            Arc::new(SqliteStateStore::new(&state_db_path).expect("Failed to open state store"));

        let auth = SpotifyAuthClient::new(
            upstream.token_url(),
            "test-client-id".to_string(),
            "test-client-secret".to_string(),
        );
        let spotify = SpotifyClient::new(upstream.api_url());
        let mirror = Arc::new(MirrorService::new(
            mirror_store.clone(),
            spotify,
            TokenCache::new(state_store, auth),
        ));

        let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::new(
            upstream.email_api_url(),
            "re_test_key".to_string(),
            "Portfolio <from@test.local>".to_string(),
            "owner@test.local".to_string(),
        ));
        let contact = Arc::new(ContactService::new(mirror_store, mailer));

        let github = Arc::new(GithubClient::new(
            upstream.github_api_url(),
            "gh_test_token".to_string(),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let app = make_app(config, mirror, contact, github);

        // Spawn server in background task with graceful shutdown
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            state_db_path,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
