//! Crate error type.
//!
//! Every fallible call returns [`Error`]. Its [`Kind`] says which layer failed; the source
//! carries the detail and can be recovered with [`Error::downcast_ref`], for example as a
//! [`WsError`](crate::ws::WsError).

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use strum_macros::Display;

use crate::ws::WsError;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Kind {
    /// Invalid stream parameters, endpoint or configuration, rejected before any connection
    #[strum(serialize = "validation")]
    Validation,
    /// Failure inside a dependency that is not tied to a connection
    #[strum(serialize = "internal")]
    Internal,
    /// Connection, transport and frame decoding failures
    #[strum(serialize = "websocket")]
    WebSocket,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Validation,
            Validation {
                reason: reason.into(),
            },
        )
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref()?.downcast_ref::<E>()
    }

    /// Whether the session that produced this error is gone.
    ///
    /// The stream reconnects on its own after such errors (unless reconnection is disabled);
    /// every other error only cost the frame or keepalive it was raised for.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        self.downcast_ref::<WsError>()
            .is_some_and(WsError::is_disconnect)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} error: {source}", self.kind),
            None => write!(f, "{} error", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

/// Reason a parameter or configuration value was rejected.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl StdError for Validation {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::with_source(Kind::Validation, e)
    }
}
