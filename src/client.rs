//! Client struct definition
//!
//! Represents a connected, named participant and its outbound queue.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::ClientId;

/// Connected client information
///
/// The `sender` is the only producer handle for this client's outbound
/// queue once the client has been handed to the Broadcaster. Dropping the
/// `Client` closes the queue, which ends the client's Output Pump.
#[derive(Debug)]
pub struct Client {
    /// Session identifier
    pub id: ClientId,
    /// Name picked at connect time (may be empty, may collide)
    pub name: String,
    /// Server → Client line queue
    pub sender: mpsc::Sender<String>,
}

impl Client {
    /// Create a new client with the given ID, name and sender channel
    pub fn new(id: ClientId, name: impl Into<String>, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sender,
        }
    }

    /// Queue a line for this client
    ///
    /// Waits while the queue is full. Returns an error if the Output Pump
    /// has gone away.
    pub async fn send(&self, line: impl Into<String>) -> Result<(), SendError> {
        self.sender
            .send(line.into())
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}
