//! Typed stream client shared by the spot, USDⓈ-M and COIN-M families.
//!
//! [`Client`] is parameterized by a [`Family`] marker, so streams that only exist on some
//! families are only callable there: derivative streams need [`Derivatives`], and the
//! family modules ([`crate::spot`], [`crate::futures`], [`crate::delivery`]) add their own.

pub mod client;
pub(crate) mod params;
pub mod types;
pub mod user_data;

use std::time::Duration;

use serde::de::DeserializeOwned;

pub use client::Client;
pub use params::DEPTH_LEVELS;
pub use types::{
    AggTrade, BookTicker, DepthUpdate, Kline, KlineData, Liquidation, LiquidationOrder,
    MarkPrice, MiniTicker, Ticker,
};
pub use user_data::UserDataEvent;

use crate::endpoint::Market;
use crate::ws::Symbolic;

/// A market family. Implemented by [`crate::spot::Spot`], [`crate::futures::UsdM`] and
/// [`crate::delivery::CoinM`] only.
pub trait Family: sealed::Sealed + Send + Sync + 'static {
    const MARKET: Market;
    /// Diff depth period served when no rate suffix is given
    const DEFAULT_DEPTH_RATE: Duration;
    /// Every accepted diff depth period, default included
    const DEPTH_RATES: &'static [Duration];

    /// Payload of partial book depth streams
    type PartialDepth: DeserializeOwned + Symbolic + Send + 'static;
}

/// Families with mark price, liquidation and user data streams.
pub trait Derivatives: Family {
    /// User data event types dropped before decoding
    const USER_DATA_SKIP: &'static [&'static str];
}

pub(crate) mod sealed {
    pub trait Sealed {}
}
