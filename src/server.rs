//! TCP accept loop
//!
//! Wires the listener to the Broadcaster and spawns one session per
//! accepted connection.

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Channel buffer size for Broadcaster commands
const COMMAND_BUFFER_SIZE: usize = 256;

/// Start the Broadcaster and accept connections forever
///
/// A failed accept is logged and skipped; it never takes down the
/// Broadcaster or other sessions.
pub async fn serve(listener: TcpListener, config: ServerConfig) {
    let (broadcaster, actor) = Broadcaster::channel(COMMAND_BUFFER_SIZE);
    tokio::spawn(actor.run());

    info!("Broadcaster actor started");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let broadcaster = broadcaster.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, broadcaster, config).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
