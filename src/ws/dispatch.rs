//! Delivery of decoded events, errors and informational notices to caller callbacks.
//!
//! All callbacks run on the connection's lifecycle task, one at a time, in the order
//! frames arrived. A slow callback delays the next read, so callers should hand work
//! off (for example to a channel) rather than block.

use std::fmt;

use bitflags::bitflags;

use crate::error::Error;

bitflags! {
    /// Which informational notices are forwarded to the notice handler.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NoticeKinds: u8 {
        /// No notices.
        const NONE = 0;

        /// A session was established.
        const CONNECTED = 1;

        /// The peer sent a close frame, or the stream was shut down.
        const CLOSED = 1 << 1;

        /// The peer sent a ping.
        const PING_RECEIVED = 1 << 2;

        /// The peer sent a pong.
        const PONG_RECEIVED = 1 << 3;

        /// A keepalive frame was written.
        const KEEPALIVE = 1 << 4;

        /// Every notice.
        const ALL = Self::CONNECTED.bits()
            | Self::CLOSED.bits()
            | Self::PING_RECEIVED.bits()
            | Self::PONG_RECEIVED.bits()
            | Self::KEEPALIVE.bits();
    }
}

impl Default for NoticeKinds {
    fn default() -> Self {
        Self::CONNECTED | Self::CLOSED
    }
}

/// Informational connection condition. Never an error.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A session to `url` was established
    Connected { url: String },
    /// The session closed; code and reason are those of the peer's close frame when present
    Closed { code: Option<u16>, reason: String },
    /// The peer sent a ping
    PingReceived,
    /// The peer sent a pong
    PongReceived,
    /// A keepalive frame was written
    KeepaliveSent,
}

impl Notice {
    #[must_use]
    pub const fn kind(&self) -> NoticeKinds {
        match self {
            Self::Connected { .. } => NoticeKinds::CONNECTED,
            Self::Closed { .. } => NoticeKinds::CLOSED,
            Self::PingReceived => NoticeKinds::PING_RECEIVED,
            Self::PongReceived => NoticeKinds::PONG_RECEIVED,
            Self::KeepaliveSent => NoticeKinds::KEEPALIVE,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { url } => write!(f, "websocket connected to {url}"),
            Self::Closed {
                code: Some(code),
                reason,
            } => write!(f, "websocket closed, code: {code}, message: {reason}"),
            Self::Closed { code: None, .. } => write!(f, "websocket closed"),
            Self::PingReceived => write!(f, "ping received"),
            Self::PongReceived => write!(f, "pong received"),
            Self::KeepaliveSent => write!(f, "websocket keepalive"),
        }
    }
}

type EventFn<E> = Box<dyn FnMut(E) + Send>;
type ErrorFn = Box<dyn FnMut(Error) + Send>;
type NoticeFn = Box<dyn FnMut(Notice) + Send>;

/// The caller's callbacks for one stream.
///
/// # Example
///
/// ```
/// use binance_stream_client::ws::Dispatcher;
///
/// let dispatcher = Dispatcher::new(
///     |price: String| println!("{price}"),
///     |error| eprintln!("{error}"),
/// )
/// .with_notices(|notice| eprintln!("{notice}"));
/// ```
pub struct Dispatcher<E> {
    on_event: EventFn<E>,
    on_error: ErrorFn,
    on_notice: Option<NoticeFn>,
}

impl<E> Dispatcher<E> {
    pub fn new<H, F>(on_event: H, on_error: F) -> Self
    where
        H: FnMut(E) + Send + 'static,
        F: FnMut(Error) + Send + 'static,
    {
        Self {
            on_event: Box::new(on_event),
            on_error: Box::new(on_error),
            on_notice: None,
        }
    }

    /// Also receive informational notices, filtered by the connection's [`NoticeKinds`].
    #[must_use]
    pub fn with_notices<N>(mut self, on_notice: N) -> Self
    where
        N: FnMut(Notice) + Send + 'static,
    {
        self.on_notice = Some(Box::new(on_notice));
        self
    }

    pub(crate) fn event(&mut self, event: E) {
        (self.on_event)(event);
    }

    pub(crate) fn error<R: Into<Error>>(&mut self, error: R) {
        let error = error.into();
        #[cfg(feature = "tracing")]
        tracing::warn!(%error, "websocket error");
        (self.on_error)(error);
    }

    pub(crate) fn notice(&mut self, enabled: NoticeKinds, notice: Notice) {
        if !enabled.contains(notice.kind()) {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(%notice, "websocket notice");
        if let Some(on_notice) = self.on_notice.as_mut() {
            on_notice(notice);
        }
    }
}

impl<E> fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("on_notice", &self.on_notice.is_some())
            .finish_non_exhaustive()
    }
}
