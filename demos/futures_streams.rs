//! USDⓈ-M futures stream explorer.
//!
//! Opens a mark price stream and a combined aggregated trade stream, logs what arrives for a
//! while, then stops both and reports the connection status.
//!
//! Run with tracing enabled:
//! ```sh
//! RUST_LOG=info,binance_stream_client=debug cargo run --example futures_streams --features tracing
//! ```

use std::time::Duration;

use binance_stream_client::futures::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::default().with_notices(|notice| info!(%notice));

    let mark_price = client
        .serve_mark_price(
            "BTCUSDT",
            Some(Duration::from_secs(1)),
            |price| {
                info!(
                    stream = "mark_price",
                    symbol = %price.symbol,
                    mark = %price.mark_price,
                    funding = %price.funding_rate
                );
            },
            |error| warn!(stream = "mark_price", %error),
        )
        .await?;

    let trades = client
        .serve_combined_agg_trade(
            &["BTCUSDT", "ETHUSDT"],
            |trade| {
                info!(
                    stream = "agg_trade",
                    symbol = %trade.symbol,
                    price = %trade.price,
                    quantity = %trade.quantity
                );
            },
            |error| warn!(stream = "agg_trade", %error),
        )
        .await?;

    tokio::time::sleep(Duration::from_secs(10)).await;

    mark_price.stop_and_wait().await;
    trades.stop_and_wait().await;
    info!(
        mark_price = ?mark_price.status(),
        agg_trade = ?trades.status(),
        "streams stopped"
    );

    Ok(())
}
