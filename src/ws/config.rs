#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use bon::Builder;

use super::dispatch::NoticeKinds;
use crate::Result;
use crate::error::Error;

const DEFAULT_HANDSHAKE_TIMEOUT_DURATION: Duration = Duration::from_secs(45);
const DEFAULT_CLOSE_TIMEOUT_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_HEARTBEAT_WRITE_TIMEOUT_DURATION: Duration = Duration::from_secs(10);
const DEFAULT_INITIAL_BACKOFF_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
/// Largest accepted message, in bytes.
const DEFAULT_READ_LIMIT: usize = 655_350;

/// Configuration for WebSocket client behavior.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use binance_stream_client::ws::config::{Config, HeartbeatConfig};
///
/// let config = Config::builder()
///     .heartbeat(
///         HeartbeatConfig::builder()
///             .interval(Duration::from_secs(30))
///             .build(),
///     )
///     .build();
/// assert_eq!(config.heartbeat.interval, Duration::from_secs(30));
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Upper bound for the opening handshake
    #[builder(default = DEFAULT_HANDSHAKE_TIMEOUT_DURATION)]
    pub handshake_timeout: Duration,
    /// Upper bound for sending our close frame on shutdown
    #[builder(default = DEFAULT_CLOSE_TIMEOUT_DURATION)]
    pub close_timeout: Duration,
    /// Maximum size of a single inbound message
    #[builder(default = DEFAULT_READ_LIMIT)]
    pub read_limit: usize,
    /// Keepalive behavior
    #[builder(default)]
    pub heartbeat: HeartbeatConfig,
    /// Reconnection strategy configuration
    #[builder(default)]
    pub reconnect: ReconnectConfig,
    /// Which informational notices reach the notice handler
    #[builder(default)]
    pub notices: NoticeKinds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT_DURATION,
            close_timeout: DEFAULT_CLOSE_TIMEOUT_DURATION,
            read_limit: DEFAULT_READ_LIMIT,
            heartbeat: HeartbeatConfig::default(),
            reconnect: ReconnectConfig::default(),
            notices: NoticeKinds::default(),
        }
    }
}

impl Config {
    /// Reject settings that would make the connection loop spin or never make progress.
    pub fn validate(&self) -> Result<()> {
        if self.handshake_timeout.is_zero() {
            return Err(Error::validation("handshake_timeout must be greater than zero"));
        }
        if self.read_limit == 0 {
            return Err(Error::validation("read_limit must be greater than zero"));
        }
        if self.heartbeat.enabled {
            if self.heartbeat.interval.is_zero() {
                return Err(Error::validation("heartbeat interval must be greater than zero"));
            }
            if self.heartbeat.write_timeout.is_zero() {
                return Err(Error::validation(
                    "heartbeat write_timeout must be greater than zero",
                ));
            }
            if self.heartbeat.pong_timeout.is_some_and(|d| d.is_zero()) {
                return Err(Error::validation(
                    "heartbeat pong_timeout must be greater than zero",
                ));
            }
        }
        if self.reconnect.enabled {
            if self.reconnect.initial_backoff.is_zero() {
                return Err(Error::validation("initial_backoff must be greater than zero"));
            }
            if self.reconnect.max_backoff < self.reconnect.initial_backoff {
                return Err(Error::validation(
                    "max_backoff must not be smaller than initial_backoff",
                ));
            }
            let multiplier = self.reconnect.backoff_multiplier;
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(Error::validation(
                    "backoff_multiplier must be a finite number of at least 1.0",
                ));
            }
        }
        Ok(())
    }
}

/// Which keepalive control frame the peer expects.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeepaliveFrame {
    /// Send a ping and expect the peer to answer with a pong
    #[default]
    Ping,
    /// Send an unsolicited pong
    Pong,
}

/// What a failed keepalive does to the connection.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeartbeatFailure {
    /// Report through the error handler and keep reading
    #[default]
    Report,
    /// Report, then drop the session and reconnect
    Reconnect,
}

/// Configuration for the keepalive task.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct HeartbeatConfig {
    /// Whether keepalive frames are sent at all
    #[builder(default = true)]
    pub enabled: bool,
    /// Interval between keepalive frames
    #[builder(default = DEFAULT_HEARTBEAT_INTERVAL_DURATION)]
    pub interval: Duration,
    /// Upper bound for writing one keepalive frame
    #[builder(default = DEFAULT_HEARTBEAT_WRITE_TIMEOUT_DURATION)]
    pub write_timeout: Duration,
    /// Frame kind to send
    #[builder(default)]
    pub frame: KeepaliveFrame,
    /// Window after a ping in which some inbound activity must be seen. `None` disables the check.
    pub pong_timeout: Option<Duration>,
    /// What a failed keepalive does to the connection
    #[builder(default)]
    pub on_failure: HeartbeatFailure,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_HEARTBEAT_INTERVAL_DURATION,
            write_timeout: DEFAULT_HEARTBEAT_WRITE_TIMEOUT_DURATION,
            frame: KeepaliveFrame::default(),
            pong_timeout: None,
            on_failure: HeartbeatFailure::default(),
        }
    }
}

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct ReconnectConfig {
    /// Whether a dropped session is re-established at all
    #[builder(default = true)]
    pub enabled: bool,
    /// Maximum number of consecutive failed reconnection attempts before giving up.
    /// `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Initial backoff duration for first reconnection attempt
    #[builder(default = DEFAULT_INITIAL_BACKOFF_DURATION)]
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    #[builder(default = DEFAULT_MAX_BACKOFF_DURATION)]
    pub max_backoff: Duration,
    /// Multiplier for exponential backoff
    #[builder(default = DEFAULT_BACKOFF_MULTIPLIER)]
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: None, // Infinite reconnection by default
            initial_backoff: DEFAULT_INITIAL_BACKOFF_DURATION,
            max_backoff: DEFAULT_MAX_BACKOFF_DURATION,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl From<ReconnectConfig> for ExponentialBackoff {
    fn from(config: ReconnectConfig) -> Self {
        ExponentialBackoffBuilder::default()
            .with_initial_interval(config.initial_backoff)
            .with_max_interval(config.max_backoff)
            .with_multiplier(config.backoff_multiplier)
            .with_max_elapsed_time(None) // We handle max attempts separately
            .build()
    }
}
