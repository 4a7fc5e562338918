//! Multi-client TCP Chat Server - Entry Point
//!
//! Binds the listener and hands it to the accept loop.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_server=info")),
        )
        .init();

    // Bind address from command line or default
    let config = ServerConfig::from_args(env::args().skip(1));

    let listener = TcpListener::bind(&config.addr).await?;
    info!(
        "Chat server listening on {} (idle timeout {:?})",
        config.addr,
        config.idle_timeout()
    );

    serve(listener, config).await;

    Ok(())
}
