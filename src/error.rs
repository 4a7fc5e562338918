//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// Application-level errors
///
/// Every variant is terminal for the session that hit it. None of them
/// reach the Broadcaster or any other session.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client's socket (fatal for that client)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (overlong line or IO failure while reading)
    #[error("Line read error: {0}")]
    Lines(#[from] AnyDelimiterCodecError),

    /// Channel send error (fatal - Broadcaster is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Write attempted after the connection was closed
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
