//! Connection Session
//!
//! Runs one client from name prompt to disconnect: registers it with the
//! Broadcaster, starts its Output Pump and Idle Watchdog, relays its input
//! lines as chat messages, and tears everything down exactly once.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcaster::BroadcasterHandle;
use crate::client::Client;
use crate::config::ServerConfig;
use crate::connection::{ClientReader, ClientWriter};
use crate::error::AppError;
use crate::message;
use crate::pump;
use crate::types::ClientId;
use crate::watchdog::{IdleWatchdog, WatchdogOutcome};

/// Handle a new TCP connection
pub async fn handle_connection(
    stream: TcpStream,
    broadcaster: BroadcasterHandle,
    config: ServerConfig,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let (reader, writer) = stream.into_split();
    run_session(reader, writer, broadcaster, config).await
}

/// Drive one client session over any line-oriented byte stream
pub async fn run_session<R, W>(
    reader: R,
    writer: W,
    broadcaster: BroadcasterHandle,
    config: ServerConfig,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut lines = ClientReader::new(reader, config.max_line_length);
    let writer = ClientWriter::new(writer);

    writer.write_str(message::NAME_PROMPT).await?;
    let name = match lines.next_line().await {
        Some(Ok(name)) => name,
        Some(Err(e)) => {
            debug!("Name read failed, continuing with empty name: {}", e);
            String::new()
        }
        None => String::new(),
    };

    let client_id = ClientId::new();
    info!("Client {} connected as '{}'", client_id, name);

    let (queue_tx, queue_rx) = mpsc::channel::<String>(config.queue_capacity);
    let client = Client::new(client_id, name.clone(), queue_tx);
    let pump = tokio::spawn(pump::run(client_id, queue_rx, writer.clone()));

    let _ = client.send(message::welcome(&name)).await;
    // Enter before announcing so the entrant sees its own arrival line.
    broadcaster.enter(client).await?;
    broadcaster.broadcast(message::arrived(&name)).await?;

    let kicked = CancellationToken::new();
    let (activity_tx, activity_rx) = mpsc::channel(1);
    let watchdog = IdleWatchdog::new(
        client_id,
        name.as_str(),
        writer.clone(),
        broadcaster.clone(),
        kicked.clone(),
        &config,
    );
    let watchdog = tokio::spawn(watchdog.run(activity_rx));

    loop {
        let next = tokio::select! {
            biased;
            _ = kicked.cancelled() => break,
            next = lines.next_line() => next,
        };

        match next {
            Some(Ok(text)) => {
                // Activity is acknowledged before the line goes out.
                let _ = activity_tx.send(()).await;
                if kicked.is_cancelled() {
                    break;
                }
                broadcaster
                    .broadcast(message::chat_line_now(&name, &text))
                    .await?;
            }
            Some(Err(e)) => {
                warn!("Read error for {}: {}", client_id, e);
                break;
            }
            None => {
                debug!("Client {} closed input", client_id);
                break;
            }
        }
    }

    drop(activity_tx);
    let outcome = watchdog.await.unwrap_or(WatchdogOutcome::Released);
    if outcome == WatchdogOutcome::Released {
        broadcaster.leave(client_id, name.as_str()).await?;
    }
    broadcaster.broadcast(message::left(&name)).await?;

    // Leave closed the queue; let the pump flush what is left before closing.
    let _ = pump.await;
    writer.close().await;

    info!("Client {} ('{}') disconnected", client_id, name);

    Ok(())
}
