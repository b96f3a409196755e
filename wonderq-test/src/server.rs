//! Test server management

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;
use wonderq_queue::{Clock, QueueStore, DEFAULT_VISIBILITY_TIMEOUT};

use crate::client::{ClientError, WonderQClient};

/// A running WonderQ test server
pub struct TestServer {
    /// Store shared with the serving task, for introspection
    store: Arc<QueueStore>,
    /// The address the server is bound to
    addr: SocketAddr,
    /// Base URL
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server with the production visibility timeout
    pub async fn start() -> Result<Self, TestError> {
        Self::start_with_store(Arc::new(QueueStore::new(DEFAULT_VISIBILITY_TIMEOUT))).await
    }

    /// Start a server whose leases expire after `timeout`
    pub async fn start_with_timeout(timeout: Duration) -> Result<Self, TestError> {
        Self::start_with_store(Arc::new(QueueStore::new(timeout))).await
    }

    /// Start a server whose lease expiry follows `clock`
    pub async fn start_with_clock(
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TestError> {
        Self::start_with_store(Arc::new(QueueStore::with_clock(timeout, clock))).await
    }

    /// Serve an existing store on a random local port
    pub async fn start_with_store(store: Arc<QueueStore>) -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TestError::StartFailed(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TestError::StartFailed(e.to_string()))?;

        let app = Router::new()
            .route("/", get(|| async { "Hello Welcome to WonderQ!" }))
            .merge(wonderq_queue::routes())
            .with_state(store.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!(error = %e, "Test server exited with error");
            }
        });

        info!(%addr, "WonderQ test server ready");
        Ok(Self {
            store,
            addr,
            base_url: format!("http://{}", addr),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The store behind the server
    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    /// Get a client for the queue routes
    pub fn client(&self) -> Result<WonderQClient, TestError> {
        WonderQClient::new(self.base_url.clone()).map_err(TestError::Client)
    }

    /// Stop the server and wait for in-flight requests
    pub async fn stop(&mut self) {
        info!("Stopping WonderQ test server");
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("WonderQ test server stopped");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Errors that can occur with test server
#[derive(Debug, Error)]
pub enum TestError {
    #[error("Failed to start server: {0}")]
    StartFailed(String),
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}
