//! WonderQ - minimal lease-based message queue
//!
//! Producers enqueue text messages, consumers lease one at a time and report
//! completion or failure. A leased message that is neither acknowledged nor
//! released becomes deliverable again after the visibility timeout.

mod config;
mod router;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::lookup_host;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wonderq_queue::QueueStore;

#[derive(Parser, Debug)]
#[command(name = "wonderq")]
#[command(about = "Minimal lease-based message queue over HTTP", long_about = None)]
struct Args {
    /// Host to bind to [default: localhost]
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Visibility timeout in milliseconds [default: 10000]
    #[arg(long, env = "WONDERQ_VISIBILITY_TIMEOUT_MS")]
    visibility_timeout_ms: Option<u64>,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long, env = "WONDERQ_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "WONDERQ_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "wonderq={level},wonderq_queue={level},tower_http=debug",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load(args.config.as_deref())?.with_overrides(
        args.host,
        args.port,
        args.visibility_timeout_ms,
    );

    info!("Starting WonderQ...");
    info!(
        "  Visibility timeout: {} ms",
        config.queue.visibility_timeout_ms
    );

    let store = Arc::new(QueueStore::new(config.queue.visibility_timeout()));
    let app = router::create_router(store);

    // "localhost" is not a socket address literal, so resolve it
    let addr: SocketAddr = lookup_host(config.bind_address())
        .await?
        .next()
        .ok_or_else(|| anyhow::anyhow!("could not resolve {}", config.bind_address()))?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("WonderQ stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    info!("Received shutdown signal");
}
