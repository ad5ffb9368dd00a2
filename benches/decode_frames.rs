/// Benchmarks for frame decoding on the hot paths of market data streams: order book diffs
/// and aggregated trades, both as bare single-topic frames and as combined-stream envelopes.
use binance_stream_client::market::{AggTrade, DepthUpdate};
use binance_stream_client::spot::PartialDepth;
use binance_stream_client::ws::{CombinedParser, JsonParser, MessageParser as _};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

const DEPTH_UPDATE: &str = r#"{"e":"depthUpdate","E":1571889248277,"T":1571889248276,
    "s":"BTCUSDT","U":390497796,"u":390497878,"pu":390497794,
    "b":[["7403.89","0.002"],["7403.90","3.906"],["7404.00","1.428"],["7404.85","5.239"],
    ["7405.43","2.562"]],
    "a":[["7405.96","3.340"],["7406.63","4.525"],["7407.08","2.475"],["7407.15","4.800"],
    ["7407.20","0.175"]]}"#;

const AGG_TRADE: &str = r#"{"e":"aggTrade","E":123456789,"s":"BTCUSDT","a":5933014,
    "p":"0.001","q":"100","f":100,"l":105,"T":123456785,"m":true}"#;

fn envelope(stream: &str, data: &str) -> String {
    format!(r#"{{"stream":"{stream}","data":{data}}}"#)
}

fn bench_single_topic(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/single");

    let parser = JsonParser::<DepthUpdate>::new();
    group.throughput(Throughput::Bytes(DEPTH_UPDATE.len() as u64));
    group.bench_function("DepthUpdate", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(DEPTH_UPDATE.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    let parser = JsonParser::<AggTrade>::new();
    group.throughput(Throughput::Bytes(AGG_TRADE.len() as u64));
    group.bench_function("AggTrade", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(AGG_TRADE.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    group.finish();
}

fn bench_combined(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/combined");

    let depth = envelope("btcusdt@depth@100ms", DEPTH_UPDATE);
    let parser = CombinedParser::<DepthUpdate>::for_topics(&["depth"]);
    group.throughput(Throughput::Bytes(depth.len() as u64));
    group.bench_function("DepthUpdate", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(depth.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    let trade = envelope("btcusdt@aggTrade", AGG_TRADE);
    let parser = CombinedParser::<AggTrade>::for_topics(&["aggTrade"]);
    group.throughput(Throughput::Bytes(trade.len() as u64));
    group.bench_function("AggTrade", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(trade.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    // Frames of other topics are dropped before the payload is decoded
    let parser = CombinedParser::<AggTrade>::for_topics(&["kline"]);
    group.bench_function("filtered", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(trade.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    let partial = envelope(
        "bnbbtc@depth5",
        r#"{"lastUpdateId":160,"bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}"#,
    );
    let parser = CombinedParser::<PartialDepth>::for_topics(&["depth5", "depth10", "depth20"]);
    group.throughput(Throughput::Bytes(partial.len() as u64));
    group.bench_function("PartialDepth", |b| {
        b.iter(|| {
            let events = parser
                .parse(std::hint::black_box(partial.as_bytes()))
                .expect("Decoding should succeed");
            std::hint::black_box(events);
        });
    });

    group.finish();
}

criterion_group!(decode_benches, bench_single_topic, bench_combined);
criterion_main!(decode_benches);
