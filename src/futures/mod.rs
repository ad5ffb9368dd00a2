//! USDⓈ-margined futures streams.
//!
//! **Feature flag:** `usdm` (required to use this module)
//!
//! # Example
//!
//! ```rust, no_run
//! use std::time::Duration;
//!
//! use binance_stream_client::futures::Client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::default();
//!     let handle = client
//!         .serve_mark_price(
//!             "BTCUSDT",
//!             Some(Duration::from_secs(1)),
//!             |price| println!("{} {}", price.symbol, price.mark_price),
//!             |error| eprintln!("{error}"),
//!         )
//!         .await?;
//!
//!     handle.done().await;
//!     Ok(())
//! }
//! ```

pub mod types;

use std::time::Duration;

pub use types::{BlvtBasket, BlvtInfo, BlvtKline, BlvtKlineData, CompositeIndex, Composition, ContractInfo};

use crate::Result;
use crate::endpoint::{Market, StreamName, Subscription};
use crate::error::Error;
use crate::market::params::{symbol_stream, token_stream};
use crate::market::{Derivatives, DepthUpdate, Family, sealed};
use crate::types::KlineInterval;
use crate::ws::{JsonParser, StreamHandle};

/// USDⓈ-M family marker.
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct UsdM;

impl sealed::Sealed for UsdM {}

impl Family for UsdM {
    const MARKET: Market = Market::UsdMFutures;
    const DEFAULT_DEPTH_RATE: Duration = Duration::from_millis(250);
    const DEPTH_RATES: &'static [Duration] = &[
        Duration::from_millis(100),
        Duration::from_millis(250),
        Duration::from_millis(500),
    ];

    type PartialDepth = DepthUpdate;
}

impl Derivatives for UsdM {
    const USER_DATA_SKIP: &'static [&'static str] = &["TRADE_LITE"];
}

pub type Client = crate::market::Client<UsdM>;

impl Client {
    /// Contract listings, delistings and status changes.
    pub async fn serve_contract_info<H, R>(&self, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(ContractInfo) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        self.serve(
            &Subscription::Single(StreamName::global("!contractInfo")),
            JsonParser::new(),
            on_event,
            on_error,
        )
        .await
    }

    /// Composite index information for one index symbol.
    pub async fn serve_composite_index<H, R>(
        &self,
        symbol: &str,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(CompositeIndex) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let name = symbol_stream(symbol, "compositeIndex")?;
        self.serve(&Subscription::Single(name), JsonParser::new(), on_event, on_error)
            .await
    }

    /// Net asset value updates of one leveraged token, e.g. `BTCDOWN`.
    pub async fn serve_blvt_info<H, R>(&self, name: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(BlvtInfo) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let name = token_stream(name, "tokenNav")?;
        self.serve(&Subscription::Single(name), JsonParser::new(), on_event, on_error)
            .await
    }

    /// Net asset value candlesticks of one leveraged token.
    pub async fn serve_blvt_kline<H, R>(
        &self,
        name: &str,
        interval: KlineInterval,
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(BlvtKline) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let name = token_stream(name, format!("nav_Kline_{interval}"))?;
        self.serve(&Subscription::Single(name), JsonParser::new(), on_event, on_error)
            .await
    }
}
