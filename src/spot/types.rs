use chrono::serde::ts_milliseconds;
use serde::Deserialize;

use crate::market::types::symbolic;
use crate::types::{DateTime, Decimal, PriceLevel, Utc};
use crate::ws::Symbolic;

/// A single trade.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trade {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "q")]
    pub quantity: Decimal,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub trade_time: DateTime<Utc>,
    /// Whether the buyer was the maker
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Top of book snapshot. The payload does not name its symbol: it stays empty on
/// single-topic streams and is filled from the stream name on combined ones.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartialDepth {
    #[serde(skip)]
    pub symbol: String,
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

symbolic!(Trade, PartialDepth);
