//! Idle Watchdog
//!
//! One per client. Counts ticks since the last activity signal from the
//! session and kicks the client when the count reaches the threshold.
//!
//! ```text
//! Active(n) --tick--> Active(n + 1) --n + 1 == threshold--> Kicked
//!     ^                    |
//!     +----activity--------+ (n = 0)
//! ```

use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broadcaster::BroadcasterHandle;
use crate::config::ServerConfig;
use crate::connection::ClientWriter;
use crate::message;
use crate::types::ClientId;

/// Per-client idle tick counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleCounter {
    ticks: u32,
    threshold: u32,
}

impl IdleCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            ticks: 0,
            threshold,
        }
    }

    /// Count one tick; true once the threshold is reached
    pub fn tick(&mut self) -> bool {
        self.ticks = self.ticks.saturating_add(1);
        self.ticks >= self.threshold
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    #[cfg(test)]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

/// How a watchdog finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// Threshold reached; the watchdog already issued Leave and closed the connection
    Kicked,
    /// The session stopped signaling (activity channel closed) first
    Released,
}

/// Idle Watchdog bound to one client connection
pub struct IdleWatchdog<W> {
    client_id: ClientId,
    name: String,
    writer: ClientWriter<W>,
    broadcaster: BroadcasterHandle,
    kicked: CancellationToken,
    threshold: u32,
    tick_interval: Duration,
}

impl<W> IdleWatchdog<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// `kicked` is cancelled when the client is kicked so the session's
    /// pending read is abandoned.
    pub fn new(
        client_id: ClientId,
        name: impl Into<String>,
        writer: ClientWriter<W>,
        broadcaster: BroadcasterHandle,
        kicked: CancellationToken,
        config: &ServerConfig,
    ) -> Self {
        Self {
            client_id,
            name: name.into(),
            writer,
            broadcaster,
            kicked,
            threshold: config.idle_threshold,
            tick_interval: config.tick_interval,
        }
    }

    /// Race ticks against activity signals until kicked or released
    pub async fn run(self, mut activity: mpsc::Receiver<()>) -> WatchdogOutcome {
        let mut counter = IdleCounter::new(self.threshold);
        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if counter.tick() {
                        self.kick().await;
                        return WatchdogOutcome::Kicked;
                    }
                }
                signal = activity.recv() => match signal {
                    Some(()) => counter.reset(),
                    None => {
                        debug!("Watchdog released for {}", self.client_id);
                        return WatchdogOutcome::Released;
                    }
                },
            }
        }
    }

    /// Deregister, announce, notify the client directly, then close
    async fn kick(&self) {
        let notice = message::kicked(&self.name);
        info!("Client {} ('{}') kicked for idling", self.client_id, self.name);

        // Leave first so the broadcast below reaches everyone but the kicked
        // client, who gets the notice exactly once via the direct write.
        if self.broadcaster.leave(self.client_id, &self.name).await.is_err() {
            debug!("Broadcaster gone while kicking {}", self.client_id);
        }
        if self.broadcaster.broadcast(notice.as_str()).await.is_err() {
            debug!("Broadcaster gone while announcing kick of {}", self.client_id);
        }

        if let Err(e) = self.writer.write_line(&notice).await {
            debug!("Kick notice to {} not delivered: {}", self.client_id, e);
        }
        self.writer.close().await;
        self.kicked.cancel();
    }
}
