//! Core WebSocket infrastructure.
//!
//! Generic connection management shared by every market family: one lifecycle task per
//! stream that owns the socket, decodes frames with a [`MessageParser`], and hands events,
//! errors and notices to a [`Dispatcher`].
//!
//! # Architecture
//!
//! - [`serve`]: connects, then spawns the lifecycle task and returns a [`StreamHandle`]
//! - [`MessageParser`]: turns one frame into zero or more events
//! - [`JsonParser`] / [`CombinedParser`]: single-topic and envelope-tagged decoding
//! - [`Dispatcher`]: the caller's event, error and notice callbacks
//!
//! # Example
//!
//! ```no_run
//! use binance_stream_client::ws::config::Config;
//! use binance_stream_client::ws::{CombinedParser, Dispatcher, serve};
//! # use binance_stream_client::ws::Symbolic;
//! # #[derive(serde::Deserialize)]
//! # struct Depth { #[serde(default)] s: String }
//! # impl Symbolic for Depth {
//! #     fn symbol(&self) -> &str { &self.s }
//! #     fn set_symbol(&mut self, symbol: String) { self.s = symbol; }
//! # }
//!
//! # async fn example() -> binance_stream_client::Result<()> {
//! let handle = serve(
//!     "wss://stream.binance.com:9443/stream?streams=btcusdt@depth/ethusdt@depth",
//!     Config::default(),
//!     CombinedParser::<Depth>::for_topics(&["depth"]),
//!     Dispatcher::new(|depth: Depth| println!("{}", depth.symbol()), |e| eprintln!("{e}")),
//! )
//! .await?;
//! handle.done().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
mod heartbeat;
pub mod parser;
pub mod traits;

pub use connection::{ConnectionState, ConnectionStatus, StreamHandle, serve};
pub use dispatch::{Dispatcher, Notice, NoticeKinds};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use parser::{CombinedParser, JsonParser};
pub use traits::*;
