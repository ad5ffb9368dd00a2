#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::ops::ControlFlow;
use std::time::Instant;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff as _;
use futures::{Sink, SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, timeout};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::protocol::frame::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::Config;
use super::dispatch::{Dispatcher, Notice};
use super::error::{WsError, is_disconnect};
use super::heartbeat::Heartbeat;
use super::traits::MessageParser;
use crate::Result;
use crate::endpoint::ensure_websocket_scheme;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected {
        /// When the connection was established
        since: Instant,
    },
    /// Waiting to reconnect after the session dropped
    Reconnecting {
        /// Current reconnection attempt number, starting at 1
        attempt: u32,
    },
    /// Stop was requested; the close frame is being sent
    Closing,
    /// Terminal. No callback runs after this state is published
    Closed,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Snapshot of a connection, published by its lifecycle task.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// When the last inbound frame of any kind arrived
    pub last_activity: Option<Instant>,
    /// Reconnection attempts made over the lifetime of the stream
    pub reconnects: u32,
}

impl ConnectionStatus {
    const fn new(state: ConnectionState) -> Self {
        Self {
            state,
            last_activity: None,
            reconnects: 0,
        }
    }
}

enum SessionEnd {
    Stopped,
    Disconnected,
}

/// Owns one stream's socket, read loop, keepalive and reconnection.
///
/// Lives entirely inside the lifecycle task spawned by [`serve`]. Only that task writes to the
/// socket, updates the status channel, or invokes the dispatcher.
struct ConnectionManager<E, P> {
    url: Url,
    config: Config,
    parser: P,
    dispatcher: Dispatcher<E>,
    status_tx: watch::Sender<ConnectionStatus>,
    stop: CancellationToken,
}

/// Connect to `url` and stream decoded frames to `dispatcher` until stopped.
///
/// The first handshake happens before this returns: if it fails, the error is returned and
/// nothing is retried. Once connected, dropped sessions are re-established according to
/// `config.reconnect`, and every failure goes to the dispatcher's error handler.
///
/// # Example
///
/// ```no_run
/// use binance_stream_client::ws::config::Config;
/// use binance_stream_client::ws::{Dispatcher, JsonParser, serve};
///
/// # async fn example() -> binance_stream_client::Result<()> {
/// let handle = serve(
///     "wss://fstream.binance.com/ws/btcusdt@markPrice",
///     Config::default(),
///     JsonParser::<serde_json::Value>::new(),
///     Dispatcher::new(|event| println!("{event}"), |error| eprintln!("{error}")),
/// )
/// .await?;
///
/// handle.stop_and_wait().await;
/// # Ok(())
/// # }
/// ```
pub async fn serve<E, P>(
    url: &str,
    config: Config,
    parser: P,
    dispatcher: Dispatcher<E>,
) -> Result<StreamHandle>
where
    E: Send + 'static,
    P: MessageParser<E>,
{
    config.validate()?;
    let url = Url::parse(url)?;
    ensure_websocket_scheme(&url)?;

    let (status_tx, status_rx) = watch::channel(ConnectionStatus::new(ConnectionState::Connecting));
    let stream = handshake(&url, &config).await?;

    let stop = CancellationToken::new();
    let done = CancellationToken::new();
    let done_guard = done.clone().drop_guard();

    let manager = ConnectionManager {
        url: url.clone(),
        config,
        parser,
        dispatcher,
        status_tx,
        stop: stop.clone(),
    };
    tokio::spawn(async move {
        let _done = done_guard;
        manager.run(stream).await;
    });

    Ok(StreamHandle {
        url,
        stop,
        done,
        status_rx,
    })
}

async fn handshake(url: &Url, config: &Config) -> std::result::Result<WsStream, WsError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(%url, "opening websocket");

    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(config.read_limit))
        .max_frame_size(Some(config.read_limit));
    let connect = connect_async_with_config(url.as_str(), Some(ws_config), false);

    match timeout(config.handshake_timeout, connect).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(WsError::Connection(e)),
        Err(_elapsed) => Err(WsError::HandshakeTimeout),
    }
}

/// Send a normal close frame; the socket is dropped whether or not the peer answers.
async fn send_close<S>(sink: &mut S, close_timeout: std::time::Duration)
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    };
    let result = timeout(close_timeout, sink.send(Message::Close(Some(frame)))).await;

    #[cfg(feature = "tracing")]
    match result {
        Ok(Ok(())) => tracing::debug!("close frame sent"),
        Ok(Err(e)) => tracing::debug!(error = %e, "close frame not sent"),
        Err(_elapsed) => tracing::debug!("close frame timed out"),
    }
    #[cfg(not(feature = "tracing"))]
    let _ = &result;
}

impl<E, P> ConnectionManager<E, P>
where
    E: Send + 'static,
    P: MessageParser<E>,
{
    /// Main lifecycle loop: one session per iteration, with reconnection in between.
    async fn run(mut self, first: WsStream) {
        let mut heartbeat = Heartbeat::new(self.config.heartbeat.clone());
        let mut backoff: ExponentialBackoff = self.config.reconnect.clone().into();
        let mut stream = first;

        loop {
            self.connected();

            match self.session(stream, &mut heartbeat).await {
                SessionEnd::Stopped => break,
                SessionEnd::Disconnected => {}
            }
            heartbeat.record_activity();
            self.set_state(ConnectionState::Disconnected);

            if !self.config.reconnect.enabled {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %self.url, "reconnect disabled, closing stream");
                break;
            }

            match self.reconnect(&mut backoff).await {
                Some(next) => stream = next,
                None => break,
            }
        }

        self.set_state(ConnectionState::Closed);

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.url, "stream closed");
    }

    fn connected(&mut self) {
        self.set_state(ConnectionState::Connected {
            since: Instant::now(),
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.url, "websocket connected");

        self.dispatcher.notice(
            self.config.notices,
            Notice::Connected {
                url: self.url.to_string(),
            },
        );
    }

    fn set_state(&self, state: ConnectionState) {
        self.status_tx.send_modify(|status| status.state = state);
    }

    /// Record inbound activity without waking status receivers.
    fn touch(&self) {
        self.status_tx.send_if_modified(|status| {
            status.last_activity = Some(Instant::now());
            false
        });
    }

    /// Read, keepalive and stop handling for one live socket.
    async fn session(&mut self, stream: WsStream, heartbeat: &mut Heartbeat) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        let session = self.stop.child_token();
        let (tick_tx, mut tick_rx) = mpsc::channel(1);
        let ticker = heartbeat.spawn(tick_tx, session.clone());
        // Cancels the ticker on every exit path
        let _session = session.drop_guard();
        let stop = self.stop.clone();

        let end = loop {
            let pong_deadline = heartbeat.pong_deadline();

            tokio::select! {
                biased;

                () = stop.cancelled() => {
                    self.set_state(ConnectionState::Closing);
                    send_close(&mut write, self.config.close_timeout).await;
                    self.dispatcher.notice(
                        self.config.notices,
                        Notice::Closed { code: None, reason: String::new() },
                    );
                    break SessionEnd::Stopped;
                }

                frame = read.next() => match frame {
                    Some(Ok(message)) => {
                        heartbeat.record_activity();
                        self.touch();
                        if self.on_message(message).is_break() {
                            break SessionEnd::Disconnected;
                        }
                    }
                    Some(Err(e)) => {
                        let disconnect = is_disconnect(&e);
                        self.dispatcher.error(WsError::Connection(e));
                        if disconnect {
                            break SessionEnd::Disconnected;
                        }
                    }
                    None => {
                        self.dispatcher.error(WsError::ConnectionClosed {
                            code: None,
                            reason: String::new(),
                        });
                        break SessionEnd::Disconnected;
                    }
                },

                // A stop raised mid-write loops back to the stop arm above.
                Some(()) = tick_rx.recv() => match heartbeat.beat_until(&mut write, &stop).await {
                    None => {}
                    Some(Ok(())) => self.dispatcher.notice(self.config.notices, Notice::KeepaliveSent),
                    Some(Err(e)) => {
                        self.dispatcher.error(e);
                        if heartbeat.forces_reconnect() {
                            break SessionEnd::Disconnected;
                        }
                    }
                },

                () = sleep_until(pong_deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if pong_deadline.is_some() =>
                {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(url = %self.url, "no inbound activity after ping");
                    self.dispatcher.error(heartbeat.expired());
                    if heartbeat.forces_reconnect() {
                        break SessionEnd::Disconnected;
                    }
                }
            }
        };

        if let Some(ticker) = ticker {
            ticker.abort();
        }
        end
    }

    /// Dispatch one inbound frame. Breaks when the peer closed the session.
    fn on_message(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Text(text) => self.decode(text.as_bytes()),
            Message::Binary(bytes) => self.decode(&bytes),
            Message::Ping(_) => self
                .dispatcher
                .notice(self.config.notices, Notice::PingReceived),
            Message::Pong(_) => self
                .dispatcher
                .notice(self.config.notices, Notice::PongReceived),
            Message::Close(frame) => {
                let (code, reason) = frame.map_or((None, String::new()), |frame| {
                    (Some(u16::from(frame.code)), frame.reason.as_str().to_owned())
                });
                self.dispatcher.notice(
                    self.config.notices,
                    Notice::Closed {
                        code,
                        reason: reason.clone(),
                    },
                );
                self.dispatcher
                    .error(WsError::ConnectionClosed { code, reason });
                return ControlFlow::Break(());
            }
            Message::Frame(_) => {}
        }
        ControlFlow::Continue(())
    }

    fn decode(&mut self, bytes: &[u8]) {
        #[cfg(feature = "tracing")]
        tracing::trace!(frame = %String::from_utf8_lossy(bytes), "frame received");

        match self.parser.parse(bytes) {
            Ok(events) => {
                for event in events {
                    self.dispatcher.event(event);
                }
            }
            Err(e) => self.dispatcher.error(e),
        }
    }

    /// Re-establish the session. Returns `None` when stopped or out of attempts.
    async fn reconnect(&mut self, backoff: &mut ExponentialBackoff) -> Option<WsStream> {
        let stop = self.stop.clone();
        let mut failures = 0_u32;

        loop {
            let attempt = failures.saturating_add(1);
            self.status_tx.send_modify(|status| {
                status.state = ConnectionState::Reconnecting { attempt };
                status.reconnects = status.reconnects.saturating_add(1);
            });

            let delay = backoff
                .next_backoff()
                .unwrap_or(self.config.reconnect.max_backoff);

            #[cfg(feature = "tracing")]
            tracing::warn!(url = %self.url, attempt, ?delay, "reconnecting");

            tokio::select! {
                biased;
                () = stop.cancelled() => return None,
                () = sleep(delay) => {}
            }

            self.set_state(ConnectionState::Connecting);
            let result = tokio::select! {
                biased;
                () = stop.cancelled() => return None,
                result = handshake(&self.url, &self.config) => result,
            };

            match result {
                Ok(stream) => {
                    backoff.reset();
                    return Some(stream);
                }
                Err(e) => {
                    self.dispatcher.error(e);
                    failures = attempt;

                    if let Some(max) = self.config.reconnect.max_attempts
                        && failures >= max
                    {
                        #[cfg(feature = "tracing")]
                        tracing::error!(url = %self.url, failures, "giving up reconnecting");
                        return None;
                    }
                }
            }
        }
    }
}

/// Control and observation handle for a running stream.
///
/// Dropping the handle stops the stream.
#[derive(Debug)]
pub struct StreamHandle {
    url: Url,
    stop: CancellationToken,
    done: CancellationToken,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl StreamHandle {
    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Token that stops the stream when cancelled, for wiring into a caller's own shutdown.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Wait until the lifecycle task has exited.
    pub async fn done(&self) {
        self.done.cancelled().await;
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Token cancelled once the lifecycle task has exited.
    #[must_use]
    pub fn done_token(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Request shutdown and wait for it to complete.
    pub async fn stop_and_wait(&self) {
        self.stop();
        self.done().await;
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status_rx.borrow().state
    }

    #[must_use]
    pub fn reconnects(&self) -> u32 {
        self.status_rx.borrow().reconnects
    }

    /// Subscribe to state changes, e.g. to detect reconnections.
    #[must_use]
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
