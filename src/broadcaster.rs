//! Broadcaster actor implementation
//!
//! The single owner of the client registry. Sessions and watchdogs never
//! touch the registry; they send `BroadcastCommand`s through a
//! `BroadcasterHandle` and the actor applies them one at a time, in the
//! order they arrive on its channel.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::AppError;
use crate::message::ROSTER_HEADER;
use crate::types::ClientId;

/// Commands sent to the Broadcaster actor
#[derive(Debug)]
pub enum BroadcastCommand {
    /// Register a client under its name, replacing any previous holder
    Enter { client: Client },
    /// Deregister a session and close its outbound queue
    Leave { client_id: ClientId, name: String },
    /// Queue a line for every registered client
    Broadcast { text: String },
}

/// Cloneable sender side of the Broadcaster
///
/// Constructed once at startup and passed to every session and watchdog.
#[derive(Debug, Clone)]
pub struct BroadcasterHandle {
    sender: mpsc::Sender<BroadcastCommand>,
}

impl BroadcasterHandle {
    pub fn new(sender: mpsc::Sender<BroadcastCommand>) -> Self {
        Self { sender }
    }

    async fn send(&self, cmd: BroadcastCommand) -> Result<(), AppError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AppError::ChannelSend)
    }

    /// Hand a client (and ownership of its queue) to the registry
    pub async fn enter(&self, client: Client) -> Result<(), AppError> {
        self.send(BroadcastCommand::Enter { client }).await
    }

    pub async fn leave(&self, client_id: ClientId, name: impl Into<String>) -> Result<(), AppError> {
        self.send(BroadcastCommand::Leave {
            client_id,
            name: name.into(),
        })
        .await
    }

    pub async fn broadcast(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.send(BroadcastCommand::Broadcast { text: text.into() })
            .await
    }
}

/// The Broadcaster actor
///
/// Registry invariant: every entry holds the only live sender of an open
/// outbound queue. Removing an entry drops that sender, which closes the
/// queue exactly once.
pub struct Broadcaster {
    /// Registered clients: name -> Client
    clients: HashMap<String, Client>,
    /// Command receiver channel
    receiver: mpsc::Receiver<BroadcastCommand>,
}

impl Broadcaster {
    /// Create a new Broadcaster with the given command receiver
    pub fn new(receiver: mpsc::Receiver<BroadcastCommand>) -> Self {
        Self {
            clients: HashMap::new(),
            receiver,
        }
    }

    /// Create a Broadcaster together with its handle
    pub fn channel(buffer: usize) -> (BroadcasterHandle, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (BroadcasterHandle::new(tx), Self::new(rx))
    }

    /// Run the event loop until every handle has been dropped
    pub async fn run(mut self) {
        info!("Broadcaster started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Broadcaster shutting down");
    }

    async fn handle_command(&mut self, cmd: BroadcastCommand) {
        match cmd {
            BroadcastCommand::Enter { client } => {
                self.handle_enter(client).await;
            }
            BroadcastCommand::Leave { client_id, name } => {
                self.handle_leave(client_id, &name);
            }
            BroadcastCommand::Broadcast { text } => {
                self.handle_broadcast(&text).await;
            }
        }
    }

    /// Register a client; send it the roster if it is not alone
    async fn handle_enter(&mut self, client: Client) {
        let name = client.name.clone();
        let client_id = client.id;

        // Last entrant wins; the displaced client's queue closes here.
        if let Some(displaced) = self.clients.insert(name.clone(), client) {
            info!(
                "Client {} displaced {} under name '{}'",
                client_id, displaced.id, name
            );
        } else {
            info!("Client {} entered as '{}'", client_id, name);
        }
        debug!("Registered clients: {}", self.clients.len());

        if self.clients.len() <= 1 {
            return;
        }

        let Some(entrant) = self.clients.get(&name) else {
            return;
        };
        let mut roster = Vec::with_capacity(self.clients.len() + 1);
        roster.push(ROSTER_HEADER.to_string());
        roster.extend(self.clients.keys().cloned());

        for line in roster {
            if entrant.send(line).await.is_err() {
                debug!("Roster for {} dropped - pump gone", client_id);
                break;
            }
        }
    }

    /// Deregister a session; no-op unless the entry belongs to it
    fn handle_leave(&mut self, client_id: ClientId, name: &str) {
        match self.clients.get(name) {
            Some(client) if client.id == client_id => {
                self.clients.remove(name);
                info!("Client {} ('{}') left", client_id, name);
            }
            Some(_) => {
                debug!(
                    "Leave from {} ignored - '{}' now held by another client",
                    client_id, name
                );
            }
            None => {
                debug!("Leave from {} ignored - '{}' not registered", client_id, name);
            }
        }
        debug!("Registered clients: {}", self.clients.len());
    }

    /// Queue `text` for every client, waiting on each full queue in turn
    async fn handle_broadcast(&self, text: &str) {
        for client in self.clients.values() {
            if client.send(text).await.is_err() {
                debug!("Broadcast to {} dropped - pump gone", client.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(name: &str) -> (Client, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(64);
        (Client::new(ClientId::new(), name, tx), rx)
    }

    fn start() -> BroadcasterHandle {
        let (handle, broadcaster) = Broadcaster::channel(64);
        tokio::spawn(broadcaster.run());
        handle
    }

    /// Push a marker through the actor so every earlier command has been applied
    async fn sync(handle: &BroadcasterHandle) {
        let (marker, mut rx) = client("__marker__");
        let id = marker.id;
        handle.enter(marker).await.unwrap();
        handle.leave(id, "__marker__").await.unwrap();
        while rx.recv().await.is_some() {}
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_first_client_gets_no_roster() {
        let handle = start();
        let (a, mut a_rx) = client("A");

        handle.enter(a).await.unwrap();
        sync(&handle).await;

        assert!(drain(&mut a_rx).is_empty());
    }

    #[tokio::test]
    async fn test_second_client_gets_roster_only_to_itself() {
        let handle = start();
        let (a, mut a_rx) = client("A");
        let (b, mut b_rx) = client("B");

        handle.enter(a).await.unwrap();
        handle.enter(b).await.unwrap();
        handle.broadcast("B has arrived").await.unwrap();
        sync(&handle).await;

        let b_lines = drain(&mut b_rx);
        assert_eq!(b_lines[0], "All clients:");
        let mut names = b_lines[1..3].to_vec();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(b_lines[3], "B has arrived");
        assert_eq!(b_lines.len(), 4);

        assert_eq!(drain(&mut a_rx), vec!["B has arrived"]);
    }

    #[tokio::test]
    async fn test_broadcast_order_is_preserved() {
        let handle = start();
        let (a, mut a_rx) = client("A");
        let (b, mut b_rx) = client("B");
        handle.enter(a).await.unwrap();

        handle.broadcast("one").await.unwrap();
        handle.enter(b).await.unwrap();
        handle.broadcast("two").await.unwrap();
        handle.broadcast("three").await.unwrap();
        sync(&handle).await;

        assert_eq!(drain(&mut a_rx), vec!["one", "two", "three"]);
        let b_lines = drain(&mut b_rx);
        assert_eq!(&b_lines[b_lines.len() - 2..], &["two", "three"]);
    }

    #[tokio::test]
    async fn test_leave_closes_queue_and_stops_delivery() {
        let handle = start();
        let (a, mut a_rx) = client("A");
        let (b, mut b_rx) = client("B");
        let a_id = a.id;
        handle.enter(a).await.unwrap();
        handle.enter(b).await.unwrap();
        sync(&handle).await;
        drain(&mut b_rx);

        handle.broadcast("before").await.unwrap();
        handle.leave(a_id, "A").await.unwrap();
        handle.broadcast("after").await.unwrap();

        assert_eq!(a_rx.recv().await.as_deref(), Some("before"));
        assert!(a_rx.recv().await.is_none());

        sync(&handle).await;
        assert_eq!(drain(&mut b_rx), vec!["before", "after"]);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        let handle = start();
        let (a, mut a_rx) = client("A");
        let (b, mut b_rx) = client("B");
        let a_id = a.id;
        handle.enter(a).await.unwrap();
        handle.enter(b).await.unwrap();

        handle.leave(a_id, "A").await.unwrap();
        handle.leave(a_id, "A").await.unwrap();
        handle.leave(ClientId::new(), "nobody").await.unwrap();
        handle.broadcast("still here").await.unwrap();
        sync(&handle).await;

        assert!(a_rx.recv().await.is_none());
        assert_eq!(drain(&mut b_rx).last().map(String::as_str), Some("still here"));
    }

    #[tokio::test]
    async fn test_duplicate_name_overwrites() {
        let handle = start();
        let (first, mut first_rx) = client("A");
        let (second, mut second_rx) = client("A");
        let first_id = first.id;
        handle.enter(first).await.unwrap();
        handle.enter(second).await.unwrap();

        // Displaced entry's queue is closed; no roster since size stays 1.
        assert!(first_rx.recv().await.is_none());

        // A stale Leave from the displaced session leaves the new holder alone.
        handle.leave(first_id, "A").await.unwrap();
        handle.broadcast("hi").await.unwrap();
        sync(&handle).await;

        assert_eq!(drain(&mut second_rx), vec!["hi"]);
    }

    #[tokio::test]
    async fn test_broadcast_skips_client_with_gone_pump() {
        let handle = start();
        let (a, a_rx) = client("A");
        let (b, mut b_rx) = client("B");
        handle.enter(a).await.unwrap();
        handle.enter(b).await.unwrap();
        sync(&handle).await;
        drain(&mut b_rx);
        drop(a_rx);

        handle.broadcast("hello").await.unwrap();
        sync(&handle).await;

        assert_eq!(drain(&mut b_rx), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_handle_errors_when_broadcaster_gone() {
        let (handle, broadcaster) = Broadcaster::channel(4);
        drop(broadcaster);

        assert!(matches!(
            handle.broadcast("x").await,
            Err(AppError::ChannelSend)
        ));
    }
}
