//! Spot order book diffs for two symbols over one combined connection.
//!
//! Every event carries the symbol of the stream it arrived on, so diffs can be routed to a
//! per-symbol book without inspecting the payload.
//!
//! Run with tracing enabled:
//! ```sh
//! RUST_LOG=info cargo run --example spot_combined_depth --features tracing
//! ```

use std::time::Duration;

use binance_stream_client::spot::Client;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = Client::default();
    let handle = client
        .serve_combined_diff_depth(
            &["BTCUSDT", "ETHUSDT"],
            move |depth| drop(tx.send(depth)),
            |error| warn!(%error),
        )
        .await?;

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            Some(depth) = rx.recv() => {
                info!(
                    symbol = %depth.symbol,
                    first = depth.first_update_id,
                    last = depth.final_update_id,
                    bids = depth.bids.len(),
                    asks = depth.asks.len()
                );
            }
        }
    }

    handle.stop_and_wait().await;
    info!(state = ?handle.state(), reconnects = handle.reconnects(), "stopped");
    Ok(())
}
