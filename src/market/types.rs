//! Event payloads shared by more than one market family.
//!
//! Field names follow the venue's single-letter keys through `#[serde(rename)]`. Keys this
//! crate does not model are ignored.

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use serde::Deserialize;

use crate::types::{DateTime, Decimal, KlineInterval, PriceLevel, Side, Utc};
use crate::ws::Symbolic;

macro_rules! symbolic {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Symbolic for $ty {
                fn symbol(&self) -> &str {
                    &self.symbol
                }

                fn set_symbol(&mut self, symbol: String) {
                    self.symbol = symbol;
                }
            }
        )+
    };
}
pub(crate) use symbolic;

/// Trades aggregated for a single taker order.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggTrade {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "a")]
    pub aggregate_trade_id: i64,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "q")]
    pub quantity: Decimal,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "l")]
    pub last_trade_id: i64,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub trade_time: DateTime<Utc>,
    /// Whether the buyer was the maker
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Candlestick update.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Kline {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: KlineData,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KlineData {
    #[serde(rename = "t", with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub close_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: KlineInterval,
    /// `-1` when no trade happened in the interval
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "v")]
    pub volume: Decimal,
    #[serde(rename = "n")]
    pub trade_count: i64,
    /// Whether this candle is closed
    #[serde(rename = "x")]
    pub is_final: bool,
    #[serde(rename = "q")]
    pub quote_volume: Decimal,
    #[serde(rename = "V")]
    pub taker_buy_base_volume: Decimal,
    #[serde(rename = "Q")]
    pub taker_buy_quote_volume: Decimal,
}

impl Symbolic for Kline {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn set_symbol(&mut self, symbol: String) {
        self.kline.symbol.clone_from(&symbol);
        self.symbol = symbol;
    }
}

/// 24hr rolling window mini-ticker statistics.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MiniTicker {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "c")]
    pub close_price: Decimal,
    #[serde(rename = "o")]
    pub open_price: Decimal,
    #[serde(rename = "h")]
    pub high_price: Decimal,
    #[serde(rename = "l")]
    pub low_price: Decimal,
    #[serde(rename = "v")]
    pub base_volume: Decimal,
    #[serde(rename = "q")]
    pub quote_volume: Decimal,
}

/// 24hr rolling window ticker statistics.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ticker {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price_change: Decimal,
    #[serde(rename = "P")]
    pub price_change_percent: Decimal,
    #[serde(rename = "w")]
    pub weighted_avg_price: Decimal,
    #[serde(rename = "c")]
    pub close_price: Decimal,
    #[serde(rename = "Q")]
    pub close_quantity: Decimal,
    #[serde(rename = "o")]
    pub open_price: Decimal,
    #[serde(rename = "h")]
    pub high_price: Decimal,
    #[serde(rename = "l")]
    pub low_price: Decimal,
    #[serde(rename = "v")]
    pub base_volume: Decimal,
    #[serde(rename = "q")]
    pub quote_volume: Decimal,
    #[serde(rename = "O", with = "ts_milliseconds")]
    pub open_time: DateTime<Utc>,
    #[serde(rename = "C", with = "ts_milliseconds")]
    pub close_time: DateTime<Utc>,
    #[serde(rename = "F")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "n")]
    pub trade_count: i64,
}

/// Best bid and ask. Spot payloads carry no event or transaction time.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookTicker {
    #[serde(rename = "u")]
    pub update_id: i64,
    #[serde(rename = "E", default, with = "ts_milliseconds_option")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(rename = "T", default, with = "ts_milliseconds_option")]
    pub transaction_time: Option<DateTime<Utc>>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "b")]
    pub best_bid_price: Decimal,
    #[serde(rename = "B")]
    pub best_bid_quantity: Decimal,
    #[serde(rename = "a")]
    pub best_ask_price: Decimal,
    #[serde(rename = "A")]
    pub best_ask_quantity: Decimal,
}

/// Order book update. Used for diff depth on every family and for partial depth on
/// derivatives, which send partial books in the same shape.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepthUpdate {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    /// Derivatives only
    #[serde(rename = "T", default, with = "ts_milliseconds_option")]
    pub transaction_time: Option<DateTime<Utc>>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "U")]
    pub first_update_id: i64,
    #[serde(rename = "u")]
    pub final_update_id: i64,
    /// Final update id of the previous event; derivatives only
    #[serde(rename = "pu", default)]
    pub previous_final_update_id: Option<i64>,
    #[serde(rename = "b")]
    pub bids: Vec<PriceLevel>,
    #[serde(rename = "a")]
    pub asks: Vec<PriceLevel>,
}

/// Mark price and funding rate.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkPrice {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "p")]
    pub mark_price: Decimal,
    #[serde(rename = "i", default)]
    pub index_price: Option<Decimal>,
    #[serde(rename = "P")]
    pub estimated_settle_price: Decimal,
    #[serde(rename = "r")]
    pub funding_rate: Decimal,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub next_funding_time: DateTime<Utc>,
}

/// Forced liquidation order snapshot.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Liquidation {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "o")]
    pub order: LiquidationOrder,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiquidationOrder {
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: Side,
    #[serde(rename = "o")]
    pub order_type: String,
    #[serde(rename = "f")]
    pub time_in_force: String,
    #[serde(rename = "q")]
    pub original_quantity: Decimal,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "ap")]
    pub average_price: Decimal,
    #[serde(rename = "X")]
    pub status: String,
    #[serde(rename = "l")]
    pub last_filled_quantity: Decimal,
    #[serde(rename = "z")]
    pub accumulated_filled_quantity: Decimal,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub trade_time: DateTime<Utc>,
}

impl Symbolic for Liquidation {
    fn symbol(&self) -> &str {
        &self.order.symbol
    }

    fn set_symbol(&mut self, symbol: String) {
        self.order.symbol = symbol;
    }
}

symbolic!(AggTrade, MiniTicker, Ticker, BookTicker, DepthUpdate, MarkPrice);
