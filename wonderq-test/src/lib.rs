//! Test utilities for WonderQ
//!
//! Provides utilities for integration testing against a live HTTP server:
//! - Start/stop a WonderQ server on an ephemeral port, in process
//! - Shorten the visibility timeout or drive it with a manual clock
//! - A typed client for the queue routes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wonderq_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_queue() {
//!     let server = TestServer::start().await.unwrap();
//!     let client = server.client().unwrap();
//!
//!     let id = client.create_message("hello").await.unwrap();
//!     let leased = client.new_message().await.unwrap().unwrap();
//!     assert_eq!(leased.id, id);
//! }
//! ```

pub mod client;
pub mod server;

pub use client::{ClientError, ReceivedMessage, WireResponse, WonderQClient};
pub use server::{TestError, TestServer};

/// Install a test-friendly tracing subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wonderq_queue=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
