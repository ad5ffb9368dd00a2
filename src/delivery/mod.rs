//! COIN-margined delivery futures streams.
//!
//! **Feature flag:** `coinm` (required to use this module)
//!
//! Every stream of this family comes from the shared [`crate::market::Client`]; see its
//! derivative methods for mark price, liquidation and user data streams.

use std::time::Duration;

use crate::endpoint::Market;
use crate::market::{Derivatives, DepthUpdate, Family, sealed};

/// COIN-M family marker.
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct CoinM;

impl sealed::Sealed for CoinM {}

impl Family for CoinM {
    const MARKET: Market = Market::CoinMFutures;
    const DEFAULT_DEPTH_RATE: Duration = Duration::from_millis(250);
    const DEPTH_RATES: &'static [Duration] = &[
        Duration::from_millis(100),
        Duration::from_millis(250),
        Duration::from_millis(500),
    ];

    type PartialDepth = DepthUpdate;
}

impl Derivatives for CoinM {
    const USER_DATA_SKIP: &'static [&'static str] = &[];
}

pub type Client = crate::market::Client<CoinM>;
