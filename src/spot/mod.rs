//! Spot market streams.
//!
//! **Feature flag:** `spot` (required to use this module)
//!
//! # Example
//!
//! ```rust, no_run
//! use binance_stream_client::spot::Client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::default();
//!     let handle = client
//!         .serve_combined_diff_depth(
//!             &["BTCUSDT", "ETHUSDT"],
//!             |depth| println!("{} {} bids", depth.symbol, depth.bids.len()),
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

pub use types::{PartialDepth, Trade};

use crate::Result;
use crate::endpoint::{Market, Subscription};
use crate::error::Error;
use crate::market::params::symbol_stream;
use crate::market::{Family, sealed};
use crate::ws::{CombinedParser, JsonParser, StreamHandle};

/// Spot family marker.
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct Spot;

impl sealed::Sealed for Spot {}

impl Family for Spot {
    const MARKET: Market = Market::Spot;
    const DEFAULT_DEPTH_RATE: Duration = Duration::from_millis(1000);
    const DEPTH_RATES: &'static [Duration] =
        &[Duration::from_millis(100), Duration::from_millis(1000)];

    type PartialDepth = PartialDepth;
}

pub type Client = crate::market::Client<Spot>;

impl Client {
    /// Raw trades for one symbol.
    pub async fn serve_trade<H, R>(&self, symbol: &str, on_event: H, on_error: R) -> Result<StreamHandle>
    where
        H: FnMut(Trade) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let name = symbol_stream(symbol, "trade")?;
        self.serve(
            &Subscription::Single(name),
            JsonParser::new(),
            on_event,
            on_error,
        )
        .await
    }

    /// Raw trades for several symbols over one connection.
    pub async fn serve_combined_trade<H, R>(
        &self,
        symbols: &[&str],
        on_event: H,
        on_error: R,
    ) -> Result<StreamHandle>
    where
        H: FnMut(Trade) + Send + 'static,
        R: FnMut(Error) + Send + 'static,
    {
        let names = symbols
            .iter()
            .map(|symbol| symbol_stream(symbol, "trade"))
            .collect::<Result<Vec<_>>>()?;
        self.serve(
            &Subscription::combined(names)?,
            CombinedParser::for_topics(&["trade"]),
            on_event,
            on_error,
        )
        .await
    }
}
