//! Client connection halves
//!
//! `ClientReader` frames input into lines. Bytes that are not valid UTF-8
//! are replaced rather than rejected, so a stray byte never ends a session.
//!
//! The Output Pump, the Connection Session (prompt) and the Idle Watchdog
//! (kick notice) all write to the same socket, so the write half sits
//! behind an async mutex. Closing shuts the write half down once; later
//! writes fail with `AppError::ConnectionClosed`.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tracing::debug;

use crate::error::AppError;

/// Newline-framed, lossily decoded input lines
pub struct ClientReader<R> {
    frames: FramedRead<R, AnyDelimiterCodec>,
}

impl<R> ClientReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Lines longer than `max_line_length` bytes are reported as errors.
    pub fn new(reader: R, max_line_length: usize) -> Self {
        let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), max_line_length);
        Self {
            frames: FramedRead::new(reader, codec),
        }
    }

    /// Next line without its terminator; `None` once the peer closes input
    pub async fn next_line(&mut self) -> Option<Result<String, AppError>> {
        let frame = match self.frames.next().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e.into())),
        };
        let line = frame.strip_suffix(b"\r").unwrap_or(&frame[..]);
        Some(Ok(String::from_utf8_lossy(line).into_owned()))
    }
}

/// Cloneable handle to a connection's write half
pub struct ClientWriter<W> {
    inner: Arc<Mutex<Option<W>>>,
}

impl<W> Clone for ClientWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> ClientWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(writer))),
        }
    }

    /// Write raw text without a line terminator
    pub async fn write_str(&self, text: &str) -> Result<(), AppError> {
        let mut guard = self.inner.lock().await;
        let writer = guard.as_mut().ok_or(AppError::ConnectionClosed)?;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Write one newline-terminated line
    pub async fn write_line(&self, line: &str) -> Result<(), AppError> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');
        self.write_str(&framed).await
    }

    /// Shut down the write half. Idempotent.
    pub async fn close(&self) {
        let Some(mut writer) = self.inner.lock().await.take() else {
            return;
        };
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of closed connection failed: {}", e);
        }
    }

    #[cfg(test)]
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}
