//! Stream names, subscriptions and the URLs they connect to.
//!
//! A single-topic stream connects to `<base>/ws/<symbol>@<topic>`. A combined stream
//! multiplexes several names over one connection at `<base>/stream?streams=<a>/<b>`, and
//! every frame it delivers is wrapped in a `{"stream": ..., "data": ...}` envelope.

use std::fmt;
use std::str::FromStr;

use strum_macros::Display;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::ws::WsError;

/// Upper bound on streams multiplexed over one combined connection.
pub const MAX_COMBINED_STREAMS: usize = 1024;

/// Market family served by a stream host.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Market {
    /// Spot and margin
    #[strum(serialize = "spot")]
    Spot,
    /// USDⓈ-margined perpetual and quarterly futures
    #[strum(serialize = "futures")]
    UsdMFutures,
    /// Coin-margined delivery futures
    #[strum(serialize = "delivery")]
    CoinMFutures,
}

impl Market {
    const fn production_base(self) -> &'static str {
        match self {
            Self::Spot => "wss://stream.binance.com:9443",
            Self::UsdMFutures => "wss://fstream.binance.com",
            Self::CoinMFutures => "wss://dstream.binance.com",
        }
    }

    const fn testnet_base(self) -> &'static str {
        match self {
            Self::Spot => "wss://stream.testnet.binance.vision",
            Self::UsdMFutures => "wss://stream.binancefuture.com",
            Self::CoinMFutures => "wss://dstream.binancefuture.com",
        }
    }
}

/// Which host a client connects to.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Testnet,
    /// Any other host; `/ws/...` and `/stream?...` are appended to it
    Custom(Url),
}

impl Environment {
    /// Use a custom base URL, for example a local relay or a mock server.
    pub fn custom(base: &str) -> Result<Self> {
        let url = Url::parse(base)?;
        ensure_websocket_scheme(&url)?;
        Ok(Self::Custom(url))
    }
}

/// URL builder for one market family in one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    market: Market,
    environment: Environment,
}

impl Endpoint {
    #[must_use]
    pub const fn new(market: Market, environment: Environment) -> Self {
        Self {
            market,
            environment,
        }
    }

    #[must_use]
    pub const fn market(&self) -> Market {
        self.market
    }

    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    fn base(&self) -> &str {
        match &self.environment {
            Environment::Production => self.market.production_base(),
            Environment::Testnet => self.market.testnet_base(),
            Environment::Custom(url) => url.as_str().trim_end_matches('/'),
        }
    }

    /// URL of a single-topic stream.
    pub fn single(&self, name: &StreamName) -> Result<Url> {
        Ok(Url::parse(&format!("{}/ws/{name}", self.base()))?)
    }

    /// URL of a combined stream multiplexing `names`, in order.
    pub fn combined(&self, names: &[StreamName]) -> Result<Url> {
        validate_combined(names)?;
        let streams = names
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        Ok(Url::parse(&format!(
            "{}/stream?streams={streams}",
            self.base()
        ))?)
    }

    /// URL for either kind of subscription.
    pub fn url(&self, subscription: &Subscription) -> Result<Url> {
        match subscription {
            Subscription::Single(name) => self.single(name),
            Subscription::Combined(names) => self.combined(names),
        }
    }
}

/// One `symbol@topic` stream name, or a global one such as `!markPrice@arr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamName {
    symbol: Option<String>,
    topic: String,
}

impl StreamName {
    /// A per-symbol stream; the symbol is lowercased as the venue requires.
    #[must_use]
    pub fn new<T: Into<String>>(symbol: &str, topic: T) -> Self {
        Self {
            symbol: Some(symbol.to_lowercase()),
            topic: topic.into(),
        }
    }

    /// A per-symbol stream whose symbol is sent exactly as given.
    #[must_use]
    pub fn verbatim<T: Into<String>>(symbol: &str, topic: T) -> Self {
        Self {
            symbol: Some(symbol.to_owned()),
            topic: topic.into(),
        }
    }

    /// A stream that is not bound to one symbol.
    #[must_use]
    pub fn global<T: Into<String>>(topic: T) -> Self {
        Self {
            symbol: None,
            topic: topic.into(),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{symbol}@{}", self.topic),
            None => f.write_str(&self.topic),
        }
    }
}

impl FromStr for StreamName {
    type Err = Error;

    /// Parse the `stream` key of a combined envelope. Symbols are kept as sent.
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('!') {
            return Ok(Self::global(s));
        }
        match s.split_once('@') {
            Some((symbol, topic)) if !symbol.is_empty() && !topic.is_empty() => Ok(Self {
                symbol: Some(symbol.to_owned()),
                topic: topic.to_owned(),
            }),
            Some(_) => Err(WsError::InvalidMessage(format!("malformed stream name `{s}`")).into()),
            None if s.is_empty() => Err(WsError::InvalidMessage("empty stream name".to_owned()).into()),
            None => Ok(Self::global(s)),
        }
    }
}

/// What a connection subscribes to.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// One topic; frames are bare payloads
    Single(StreamName),
    /// Several topics over one connection; frames are envelope-tagged
    Combined(Vec<StreamName>),
}

impl Subscription {
    /// A combined subscription; fails when `names` is empty or too long.
    pub fn combined(names: Vec<StreamName>) -> Result<Self> {
        validate_combined(&names)?;
        Ok(Self::Combined(names))
    }

    #[must_use]
    pub const fn is_combined(&self) -> bool {
        matches!(self, Self::Combined(_))
    }

    #[must_use]
    pub fn names(&self) -> &[StreamName] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Combined(names) => names,
        }
    }
}

fn validate_combined(names: &[StreamName]) -> Result<()> {
    if names.is_empty() {
        return Err(Error::validation(
            "a combined stream needs at least one stream name",
        ));
    }
    if names.len() > MAX_COMBINED_STREAMS {
        return Err(Error::validation(format!(
            "a combined stream accepts at most {MAX_COMBINED_STREAMS} stream names, got {}",
            names.len()
        )));
    }
    Ok(())
}

pub(crate) fn ensure_websocket_scheme(url: &Url) -> Result<()> {
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(Error::validation(format!(
            "websocket endpoints must use ws or wss, got `{other}`"
        ))),
    }
}
