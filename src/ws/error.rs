#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Error parsing a WebSocket message
    MessageParse(serde_json::Error),
    /// The peer closed the connection, or the stream ended
    ConnectionClosed {
        /// Close code sent by the peer, if any
        code: Option<u16>,
        /// Close reason sent by the peer (may be empty)
        reason: String,
    },
    /// The opening handshake did not complete in time
    HandshakeTimeout,
    /// A keepalive or close frame could not be written in time
    WriteTimeout,
    /// No inbound activity was observed within the pong window after a ping
    HeartbeatTimeout,
    /// Received an invalid or unexpected message
    InvalidMessage(String),
}

impl WsError {
    /// Whether this error means the current session is gone and a new handshake is required.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Connection(e) => is_disconnect(e),
            Self::ConnectionClosed { .. } | Self::HandshakeTimeout => true,
            Self::MessageParse(_)
            | Self::WriteTimeout
            | Self::HeartbeatTimeout
            | Self::InvalidMessage(_) => false,
        }
    }
}

/// Classify a transport error as close-class (session is unusable) or transient.
///
/// Only errors that leave the underlying stream readable (a text frame with invalid UTF-8,
/// a full write buffer) are transient.
pub(crate) fn is_disconnect(error: &tokio_tungstenite::tungstenite::Error) -> bool {
    use tokio_tungstenite::tungstenite::Error;

    !matches!(error, Error::Utf8(_) | Error::WriteBufferFull(_))
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::MessageParse(e) => write!(f, "Failed to parse WebSocket message: {e}"),
            Self::ConnectionClosed { code: Some(code), reason } => {
                write!(f, "WebSocket connection closed ({code}): {reason}")
            }
            Self::ConnectionClosed { code: None, .. } => write!(f, "WebSocket connection closed"),
            Self::HandshakeTimeout => write!(f, "WebSocket handshake timed out"),
            Self::WriteTimeout => write!(f, "WebSocket write timed out"),
            Self::HeartbeatTimeout => write!(f, "WebSocket heartbeat timed out"),
            Self::InvalidMessage(msg) => write!(f, "Invalid WebSocket message: {msg}"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            _ => None,
        }
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}
