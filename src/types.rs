//! Re-exported types from external crates, and the small value types shared by every stream.

use serde::Deserialize;
use strum_macros::Display;

/// Date and time types for event and trade timestamps.
pub use chrono::{DateTime, Utc};
/// Arbitrary precision decimal type for prices, quantities and rates.
pub use rust_decimal::Decimal;
/// Macro for creating [`Decimal`] literals at compile time.
///
/// # Example
/// ```
/// use binance_stream_client::types::dec;
/// let price = dec!(0.55);
/// ```
pub use rust_decimal_macros::dec;

/// One order book level, sent as a `["price", "quantity"]` pair.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(Decimal, Decimal)")]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

impl From<(Decimal, Decimal)> for PriceLevel {
    fn from((price, quantity): (Decimal, Decimal)) -> Self {
        Self { price, quantity }
    }
}

/// Candlestick interval, rendered as it appears in `kline_<interval>` stream names.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize)]
pub enum KlineInterval {
    #[strum(serialize = "1s")]
    #[serde(rename = "1s")]
    OneSecond,
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    OneMinute,
    #[strum(serialize = "3m")]
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    FiveMinutes,
    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[strum(serialize = "30m")]
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    OneHour,
    #[strum(serialize = "2h")]
    #[serde(rename = "2h")]
    TwoHours,
    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    FourHours,
    #[strum(serialize = "6h")]
    #[serde(rename = "6h")]
    SixHours,
    #[strum(serialize = "8h")]
    #[serde(rename = "8h")]
    EightHours,
    #[strum(serialize = "12h")]
    #[serde(rename = "12h")]
    TwelveHours,
    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    OneDay,
    #[strum(serialize = "3d")]
    #[serde(rename = "3d")]
    ThreeDays,
    #[strum(serialize = "1w")]
    #[serde(rename = "1w")]
    OneWeek,
    #[strum(serialize = "1M")]
    #[serde(rename = "1M")]
    OneMonth,
}

/// Order side.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    #[serde(other)]
    Unknown,
}
