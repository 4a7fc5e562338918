//! Output Pump
//!
//! Drains one client's outbound queue onto its connection until the
//! Broadcaster closes the queue.

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::debug;

use crate::connection::ClientWriter;
use crate::types::ClientId;

/// Write every queued line to the client
///
/// Returns once the queue is closed and drained. A failed write ends the
/// pump early; the Broadcaster then sees the queue's receiver gone and
/// skips this client.
pub async fn run<W>(client_id: ClientId, mut queue: mpsc::Receiver<String>, writer: ClientWriter<W>)
where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(line) = queue.recv().await {
        if let Err(e) = writer.write_line(&line).await {
            debug!("Write to {} failed, ending pump: {}", client_id, e);
            return;
        }
    }
    debug!("Outbound queue closed for {}", client_id);
}
