//! User data stream events of the derivatives families.

use chrono::serde::ts_milliseconds;
use serde::Deserialize;

use crate::types::{DateTime, Decimal, Side, Utc};

/// One user data event, tagged by its `"e"` key.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "e")]
pub enum UserDataEvent {
    #[serde(rename = "ACCOUNT_UPDATE")]
    AccountUpdate(AccountUpdateEvent),
    #[serde(rename = "ORDER_TRADE_UPDATE")]
    OrderTradeUpdate(OrderTradeUpdateEvent),
    #[serde(rename = "ACCOUNT_CONFIG_UPDATE")]
    AccountConfigUpdate(AccountConfigUpdateEvent),
    #[serde(rename = "MARGIN_CALL")]
    MarginCall(MarginCallEvent),
    /// The listen key expired; a new one must be created to keep receiving events
    #[serde(rename = "listenKeyExpired")]
    ListenKeyExpired(ListenKeyExpiredEvent),
    /// Any event type this crate does not model
    #[serde(other)]
    Unknown,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountUpdateEvent {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub transaction_time: DateTime<Utc>,
    #[serde(rename = "a")]
    pub update: AccountUpdate,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountUpdate {
    /// Why the account changed, e.g. `ORDER` or `FUNDING_FEE`
    #[serde(rename = "m")]
    pub reason: String,
    #[serde(rename = "B", default)]
    pub balances: Vec<Balance>,
    #[serde(rename = "P", default)]
    pub positions: Vec<Position>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Balance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "wb")]
    pub wallet_balance: Decimal,
    #[serde(rename = "cw")]
    pub cross_wallet_balance: Decimal,
    #[serde(rename = "bc", default)]
    pub balance_change: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Position {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub position_side: String,
    #[serde(rename = "pa")]
    pub amount: Decimal,
    #[serde(rename = "mt")]
    pub margin_type: String,
    #[serde(rename = "iw")]
    pub isolated_wallet: Decimal,
    #[serde(rename = "ep", default)]
    pub entry_price: Option<Decimal>,
    #[serde(rename = "mp", default)]
    pub mark_price: Option<Decimal>,
    #[serde(rename = "up")]
    pub unrealized_pnl: Decimal,
    #[serde(rename = "cr", default)]
    pub accumulated_realized: Option<Decimal>,
    #[serde(rename = "mm", default)]
    pub maintenance_margin: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderTradeUpdateEvent {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub transaction_time: DateTime<Utc>,
    #[serde(rename = "o")]
    pub order: OrderTradeUpdate,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderTradeUpdate {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub client_order_id: String,
    #[serde(rename = "S")]
    pub side: Side,
    #[serde(rename = "o")]
    pub order_type: String,
    #[serde(rename = "f")]
    pub time_in_force: String,
    #[serde(rename = "q")]
    pub original_quantity: Decimal,
    #[serde(rename = "p")]
    pub original_price: Decimal,
    #[serde(rename = "ap")]
    pub average_price: Decimal,
    #[serde(rename = "sp")]
    pub stop_price: Decimal,
    /// `NEW`, `TRADE`, `CANCELED`, ...
    #[serde(rename = "x")]
    pub execution_type: String,
    #[serde(rename = "X")]
    pub status: String,
    #[serde(rename = "i")]
    pub order_id: i64,
    #[serde(rename = "l")]
    pub last_filled_quantity: Decimal,
    #[serde(rename = "z")]
    pub accumulated_filled_quantity: Decimal,
    #[serde(rename = "L")]
    pub last_filled_price: Decimal,
    #[serde(rename = "N", default)]
    pub commission_asset: Option<String>,
    #[serde(rename = "n", default)]
    pub commission: Option<Decimal>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub trade_time: DateTime<Utc>,
    #[serde(rename = "t")]
    pub trade_id: i64,
    #[serde(rename = "m")]
    pub is_maker: bool,
    #[serde(rename = "R")]
    pub is_reduce_only: bool,
    #[serde(rename = "ps")]
    pub position_side: String,
    #[serde(rename = "cp", default)]
    pub is_close_position: bool,
    #[serde(rename = "rp", default)]
    pub realized_pnl: Option<Decimal>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountConfigUpdateEvent {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "T", with = "ts_milliseconds")]
    pub transaction_time: DateTime<Utc>,
    /// Present when a symbol's leverage changed
    #[serde(rename = "ac", default)]
    pub leverage: Option<LeverageUpdate>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeverageUpdate {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "l")]
    pub leverage: u32,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarginCallEvent {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
    #[serde(rename = "cw", default)]
    pub cross_wallet_balance: Option<Decimal>,
    #[serde(rename = "p")]
    pub positions: Vec<Position>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenKeyExpiredEvent {
    #[serde(rename = "E", with = "ts_milliseconds")]
    pub event_time: DateTime<Utc>,
}
