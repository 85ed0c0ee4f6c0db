//! Settings for the channels that connect the parties.

use std::time::Duration;

use serde::Deserialize;

/// Timeouts and limits used by [`crate::channel::SimpleChannel`] and [`crate::tcp::TcpChannel`].
///
/// Every field has a default, so a partial configuration can be deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a party waits for a single message before giving up.
    pub recv_timeout: Duration,
    /// How often a TCP connection to a lower-index party is retried.
    pub connect_retries: usize,
    /// The pause between two TCP connection attempts.
    pub connect_retry_delay: Duration,
    /// The largest message (in bytes) accepted from a peer.
    pub max_frame_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_secs(10 * 60),
            connect_retries: 50,
            connect_retry_delay: Duration::from_millis(100),
            max_frame_len: 100 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Returns the config with a different receive timeout.
    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }
}
