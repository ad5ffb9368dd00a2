use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::params::{
    PARTIAL_DEPTH_TOPICS, depth_rate_suffix, mark_price_rate_suffix, symbol_stream, validate_levels,
};
use super::types::{AggTrade, BookTicker, DepthUpdate, Kline, Liquidation, MarkPrice, MiniTicker, Ticker};
use super::user_data::UserDataEvent;
use super::{Derivatives, Family};
use crate::Result;
use crate::endpoint::{Endpoint, Environment, StreamName, Subscription};
use crate::error::Error;
use crate::types::KlineInterval;
use crate::ws::config::Config;
use crate::ws::{
    CombinedParser, Dispatcher, JsonParser, MessageParser, Notice, StreamHandle, Symbolic,
};

type NoticeFn = Arc<dyn Fn(Notice) + Send + Sync>;

/// Stream client for one market family.
///
/// Every `serve_*` method opens its own connection and returns once the first handshake
/// succeeded. Events, errors and notices are delivered on that connection's task; the stream
/// runs until its [`StreamHandle`] is stopped or dropped.
///
/// # Example
///
/// ```no_run
/// use binance_stream_client::futures::Client;
///
/// # async fn example() -> binance_stream_client::Result<()> {
/// let client = Client::default();
/// let handle = client
///     .serve_agg_trade(
///         "BTCUSDT",
///         |trade| println!("{} {}", trade.price, trade.quantity),
///         |error| eprintln!("{error}"),
///     )
///     .await?;
///
/// handle.done().await;
/// # Ok(())
/// # }
/// ```
pub struct Client<F: Family> {
    endpoint: Endpoint,
    config: Config,
    on_notice: Option<NoticeFn>,
    _family: PhantomData<F>,
}

impl<F: Family> Default for Client<F> {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new(F::MARKET, Environment::Production),
            config: Config::default(),
            on_notice: None,
            _family: PhantomData,
        }
    }
}

impl<F: Family> Clone for Client<F> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            config: self.config.clone(),
            on_notice: self.on_notice.clone(),
            _family: PhantomData,
        }
    }
}

impl<F: Family> fmt::Debug for Client<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("on_notice", &self.on_notice.is_some())
            .finish()
    }
}

impl<F: Family> Client<F> {
    /// Create a client for `environment`; `config` applies to every stream it opens.
    pub fn new(environment: Environment, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: Endpoint::new(F::MARKET, environment),
            config,
            on_notice: None,
            _family: PhantomData,
        })
    }

    /// Client for the family's testnet hosts with the default configuration.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            endpoint: Endpoint::new(F::MARKET, Environment::Testnet),
            ..Self::default()
        }
    }

    /// Receive informational notices from every stream opened afterwards.
    ///
    /// Which notices are forwarded is set by [`Config::notices`].
    #[must_use]
    pub fn with_notices<N>(mut self, on_notice: N) -> Self
    where
        N: Fn(Notice) + Send + Sync + 'static,
    {
        self.on_notice = Some(Arc::new(on_notice));
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open any subscription with a caller-chosen parser.
    pub async fn serve<E, P, H, R>(
        &self,
        subscription: &Subscription,
        parser: P,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        E: Send + 'static,
        P: MessageParser<E>,
        H: FnMut(E) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let url = self.endpoint.url(subscription)?;
        let mut dispatcher = Dispatcher::new(on_event, on_error);
        if let Some(on_notice) = &self.on_notice {
            let on_notice = Arc::clone(on_notice);
            dispatcher = dispatcher.with_notices(move |notice| on_notice(notice));
        }
        crate::ws::serve(url.as_str(), self.config.clone(), parser, dispatcher).await
    }

    async fn single<E, H, R>(&self, name: StreamName, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        E: DeserializeOwned + Send + 'static,
        H: FnMut(E) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.serve(
            &Subscription::Single(name),
            JsonParser::new(),
            on_event,
            on_error,
        )
        .await
    }

    async fn combined<E, H, R>(
        &self,
        names: Vec<StreamName>,
        topics: &'static [&'static str],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        E: DeserializeOwned + Symbolic + Send + 'static,
        H: FnMut(E) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let subscription = Subscription::combined(names)?;
        self.serve(
            &subscription,
            CombinedParser::for_topics(topics),
            on_event,
            on_error,
        )
        .await
    }

    /// Trades aggregated per taker order for one symbol.
    pub async fn serve_agg_trade<H, R>(&self, symbol: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(AggTrade) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(symbol_stream(symbol, "aggTrade")?, on_event, on_error)
            .await
    }

    /// Aggregated trades for several symbols over one connection.
    pub async fn serve_combined_agg_trade<H, R>(
        &self,
        symbols: &[&str],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(AggTrade) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let names = symbols
            .iter()
            .map(|symbol| symbol_stream(symbol, "aggTrade"))
            .collect::<Result<Vec<_>>>()?;
        self.combined(names, &["aggTrade"], on_event, on_error).await
    }

    pub async fn serve_kline<H, R>(
        &self,
        symbol: &str,
        interval: KlineInterval,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(Kline) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let name = symbol_stream(symbol, format!("kline_{interval}"))?;
        self.single(name, on_event, on_error).await
    }

    /// Candlesticks for several `(symbol, interval)` pairs over one connection.
    pub async fn serve_combined_kline<H, R>(
        &self,
        pairs: &[(&str, KlineInterval)],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(Kline) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let names = pairs
            .iter()
            .map(|(symbol, interval)| symbol_stream(symbol, format!("kline_{interval}")))
            .collect::<Result<Vec<_>>>()?;
        self.combined(names, &["kline"], on_event, on_error).await
    }

    pub async fn serve_mini_ticker<H, R>(&self, symbol: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(MiniTicker) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(symbol_stream(symbol, "miniTicker")?, on_event, on_error)
            .await
    }

    /// Mini-tickers of every symbol that changed, one batch per frame.
    pub async fn serve_all_mini_tickers<H, R>(&self, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(Vec<MiniTicker>) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(StreamName::global("!miniTicker@arr"), on_event, on_error)
            .await
    }

    pub async fn serve_ticker<H, R>(&self, symbol: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(Ticker) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(symbol_stream(symbol, "ticker")?, on_event, on_error)
            .await
    }

    /// Tickers of every symbol that changed, one batch per frame.
    pub async fn serve_all_tickers<H, R>(&self, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(Vec<Ticker>) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(StreamName::global("!ticker@arr"), on_event, on_error)
            .await
    }

    /// Best bid and ask updates for one symbol.
    pub async fn serve_book_ticker<H, R>(&self, symbol: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(BookTicker) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(symbol_stream(symbol, "bookTicker")?, on_event, on_error)
            .await
    }

    /// Best bid and ask updates for every symbol.
    pub async fn serve_all_book_tickers<H, R>(&self, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(BookTicker) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(StreamName::global("!bookTicker"), on_event, on_error)
            .await
    }

    /// Top `levels` (5, 10 or 20) bids and asks, at the default or a supported `rate`.
    pub async fn serve_partial_depth<H, R>(
        &self,
        symbol: &str,
        levels: u8,
        rate: Option<Duration>,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(F::PartialDepth) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        validate_levels(levels)?;
        let suffix = depth_rate_suffix(rate, F::DEFAULT_DEPTH_RATE, F::DEPTH_RATES)?;
        let name = symbol_stream(symbol, format!("depth{levels}{suffix}"))?;
        self.single(name, on_event, on_error).await
    }

    /// Partial books for several `(symbol, levels)` pairs over one connection.
    pub async fn serve_combined_partial_depth<H, R>(
        &self,
        pairs: &[(&str, u8)],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(F::PartialDepth) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let names = pairs
            .iter()
            .map(|&(symbol, levels)| {
                validate_levels(levels)?;
                symbol_stream(symbol, format!("depth{levels}"))
            })
            .collect::<Result<Vec<_>>>()?;
        self.combined(names, PARTIAL_DEPTH_TOPICS, on_event, on_error).await
    }

    /// Order book diffs for one symbol, at the default or a supported `rate`.
    pub async fn serve_diff_depth<H, R>(
        &self,
        symbol: &str,
        rate: Option<Duration>,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(DepthUpdate) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let suffix = depth_rate_suffix(rate, F::DEFAULT_DEPTH_RATE, F::DEPTH_RATES)?;
        let name = symbol_stream(symbol, format!("depth{suffix}"))?;
        self.single(name, on_event, on_error).await
    }

    /// Order book diffs for several symbols over one connection.
    pub async fn serve_combined_diff_depth<H, R>(
        &self,
        symbols: &[&str],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(DepthUpdate) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let names = symbols
            .iter()
            .map(|symbol| symbol_stream(symbol, "depth"))
            .collect::<Result<Vec<_>>>()?;
        self.combined(names, &["depth"], on_event, on_error).await
    }
}

impl<F: Derivatives> Client<F> {
    /// Mark price and funding rate for one symbol, every 3 s (default) or 1 s.
    pub async fn serve_mark_price<H, R>(
        &self,
        symbol: &str,
        rate: Option<Duration>,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(MarkPrice) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let suffix = mark_price_rate_suffix(rate)?;
        let name = symbol_stream(symbol, format!("markPrice{suffix}"))?;
        self.single(name, on_event, on_error).await
    }

    /// Mark prices of every symbol, one batch per frame.
    pub async fn serve_all_mark_prices<H, R>(
        &self,
        rate: Option<Duration>,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(Vec<MarkPrice>) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let suffix = mark_price_rate_suffix(rate)?;
        let name = StreamName::global(format!("!markPrice@arr{suffix}"));
        self.single(name, on_event, on_error).await
    }

    /// Forced liquidation orders for one symbol.
    pub async fn serve_liquidation_orders<H, R>(
        &self,
        symbol: &str,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(Liquidation) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(symbol_stream(symbol, "forceOrder")?, on_event, on_error)
            .await
    }

    /// Forced liquidation orders for every symbol.
    pub async fn serve_all_liquidation_orders<H, R>(&self, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(Liquidation) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.single(StreamName::global("!forceOrder@arr"), on_event, on_error)
            .await
    }

    /// Account, order and margin events for the account owning `listen_key`.
    ///
    /// The listen key is obtained and kept alive through the REST API by the caller.
    pub async fn serve_user_data<H, R>(&self, listen_key: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(UserDataEvent) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        if listen_key.trim().is_empty() {
            return Err(Error::validation("listen key must not be empty"));
        }
        self.serve(
            &Subscription::Single(StreamName::global(listen_key)),
            JsonParser::skipping(F::USER_DATA_SKIP),
            on_event,
            on_error,
        )
        .await
    }
}
