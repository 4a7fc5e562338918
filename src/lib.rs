//! Multi-client TCP Chat Server Library
//!
//! A line-oriented chat server built on tokio using the Actor pattern for
//! shared state.
//!
//! # Features
//! - Name prompt on connect
//! - Roster of online clients sent to each newcomer
//! - Arrival, departure and chat lines broadcast to everyone
//! - Idle clients kicked after ten seconds of silence
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Broadcaster` is the single actor owning the client registry
//! - Each connection runs a session task, an output pump task and an
//!   idle watchdog task
//! - No locks around shared state - registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_server::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     serve(listener, config).await;
//! }
//! ```

pub mod broadcaster;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod pump;
pub mod server;
pub mod types;
pub mod watchdog;

// Re-export main types for convenience
pub use broadcaster::{BroadcastCommand, Broadcaster, BroadcasterHandle};
pub use client::Client;
pub use config::ServerConfig;
pub use connection::{ClientReader, ClientWriter};
pub use error::{AppError, SendError};
pub use handler::{handle_connection, run_session};
pub use server::serve;
pub use types::ClientId;
pub use watchdog::{IdleCounter, IdleWatchdog, WatchdogOutcome};
