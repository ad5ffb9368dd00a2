//! Keepalive scheduling for one live session.
//!
//! The ticker task only signals the lifecycle task; the lifecycle task owns the sink and
//! performs the write, so keepalive frames never interleave with other writes.

use futures::{Sink, SinkExt as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tokio_util::sync::CancellationToken;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::{HeartbeatConfig, HeartbeatFailure, KeepaliveFrame};
use super::error::WsError;

#[derive(Debug)]
pub(crate) struct Heartbeat {
    config: HeartbeatConfig,
    /// Set after a ping when a pong window is configured; cleared by any inbound frame
    awaiting_since: Option<Instant>,
}

impl Heartbeat {
    pub(crate) fn new(config: HeartbeatConfig) -> Self {
        Self {
            config,
            awaiting_since: None,
        }
    }

    /// Spawn the ticker for one session. Returns `None` when keepalive is disabled.
    ///
    /// The first tick fires one interval after the session starts. The task exits when
    /// `token` is cancelled or the receiving side is dropped.
    pub(crate) fn spawn(
        &self,
        tick_tx: mpsc::Sender<()>,
        token: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }
        let period = self.config.interval;

        Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tick_tx.send(()).await.is_err() {
                            break;
                        }
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!("heartbeat task stopped");
        }))
    }

    fn frame(&self) -> Message {
        match self.config.frame {
            KeepaliveFrame::Ping => Message::Ping(Vec::new().into()),
            KeepaliveFrame::Pong => Message::Pong(Vec::new().into()),
        }
    }

    /// Write one keepalive frame, bounded by the configured write timeout.
    pub(crate) async fn beat<S>(&mut self, sink: &mut S) -> Result<(), WsError>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let frame = self.frame();
        let is_ping = matches!(frame, Message::Ping(_));

        match timeout(self.config.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {
                if is_ping && self.config.pong_timeout.is_some() && self.awaiting_since.is_none() {
                    self.awaiting_since = Some(Instant::now());
                }
                Ok(())
            }
            Ok(Err(e)) => Err(WsError::Connection(e)),
            Err(_elapsed) => Err(WsError::WriteTimeout),
        }
    }

    /// Like [`Self::beat`], but gives up as soon as `stop` is cancelled. Returns `None`
    /// when the write was abandoned.
    pub(crate) async fn beat_until<S>(
        &mut self,
        sink: &mut S,
        stop: &CancellationToken,
    ) -> Option<Result<(), WsError>>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        tokio::select! {
            biased;
            () = stop.cancelled() => None,
            result = self.beat(sink) => Some(result),
        }
    }

    /// Any inbound frame proves the peer is alive.
    pub(crate) fn record_activity(&mut self) {
        self.awaiting_since = None;
    }

    /// When the pending pong window closes, if one is open.
    pub(crate) fn pong_deadline(&self) -> Option<Instant> {
        let window = self.config.pong_timeout?;
        self.awaiting_since.map(|since| since + window)
    }

    /// Close the expired pong window and return the error to report.
    pub(crate) fn expired(&mut self) -> WsError {
        self.awaiting_since = None;
        WsError::HeartbeatTimeout
    }

    /// Whether a failed keepalive drops the session.
    pub(crate) fn forces_reconnect(&self) -> bool {
        self.config.on_failure == HeartbeatFailure::Reconnect
    }
}
