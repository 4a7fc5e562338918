//! Server configuration
//!
//! The server has a single external knob, the listen address, taken from the
//! first command-line argument. The remaining fields keep the fixed protocol
//! behavior but can be tightened in tests.

use std::time::Duration;

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:8888";

/// Ticks without input before a client is kicked
pub const DEFAULT_IDLE_THRESHOLD: u32 = 10;

/// Length of one idle tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of each client's outbound queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Longest accepted input line in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Runtime settings shared by the accept loop and every session
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    pub addr: String,
    /// Number of silent ticks that triggers a kick
    pub idle_threshold: u32,
    /// Resolution of the idle watchdog
    pub tick_interval: Duration,
    /// Per-client outbound queue capacity; a full queue blocks broadcasts
    pub queue_capacity: usize,
    /// Input lines longer than this end the session
    pub max_line_length: usize,
}

impl ServerConfig {
    /// Build a config from command-line arguments (program name excluded)
    ///
    /// The first argument, if any, replaces the listen address.
    pub fn from_args<I>(mut args: I) -> Self
    where
        I: Iterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(addr) = args.next() {
            config.addr = addr;
        }
        config
    }

    /// Total silence tolerated before a kick
    pub fn idle_timeout(&self) -> Duration {
        self.tick_interval * self.idle_threshold
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            tick_interval: DEFAULT_TICK_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}
