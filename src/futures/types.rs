use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use serde::Deserialize;

use crate::market::types::symbolic;
use crate::types::{DateTime, Decimal, KlineInterval, Utc};
use crate::ws::Symbolic;

/// Contract listing or status change.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractInfo {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    /// e.g. `PERPETUAL` or `CURRENT_QUARTER`
    #[serde(rename = "ct")]
    pub contract_type: String,
    #[serde(rename = "dt", with = "ts_milliseconds")]
    pub delivery_time: DateTime<Utc>,
    #[serde(rename = "ot", default, with = "ts_milliseconds_option")]
    pub onboard_time: Option<DateTime<Utc>>,
    /// e.g. `TRADING` or `SETTLING`
    #[serde(rename = "cs")]
    pub status: String,
}

/// Composite index price and its constituents.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompositeIndex {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "c")]
    pub composition: Vec<Composition>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Composition {
    #[serde(rename = "b")]
    pub base_asset: String,
    #[serde(rename = "w")]
    pub weight_quantity: Decimal,
    #[serde(rename = "W")]
    pub weight_percent: Decimal,
}

/// Net asset value of a leveraged token and its basket.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlvtInfo {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    /// Token name, e.g. `BTCDOWN`
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "m")]
    pub tokens_issued: Decimal,
    #[serde(rename = "b", default)]
    pub baskets: Vec<BlvtBasket>,
    #[serde(rename = "n")]
    pub nav: Decimal,
    #[serde(rename = "l")]
    pub real_leverage: Decimal,
    #[serde(rename = "t")]
    pub target_leverage: Decimal,
    #[serde(rename = "f")]
    pub funding_ratio: Decimal,
}

/// One futures position held by a leveraged token.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlvtBasket {
    #[serde(rename = "s")]
    pub symbol: String,
    /// Negative for short positions
    #[serde(rename = "n")]
    pub position: Decimal,
}

/// Candlestick of a leveraged token's net asset value.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlvtKline {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: BlvtKlineData,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlvtKlineData {
    #[serde(rename = "t", with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub close_time: DateTime<Utc>,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: KlineInterval,
    #[serde(rename = "f", with = "ts_milliseconds")]
    pub first_update_time: DateTime<Utc>,
    #[serde(rename = "L", with = "ts_milliseconds")]
    pub last_update_time: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    /// Real leverage at close
    #[serde(rename = "v")]
    pub leverage: Decimal,
    #[serde(rename = "n")]
    pub update_count: i64,
}

symbolic!(ContractInfo, CompositeIndex, BlvtInfo, BlvtKline);
