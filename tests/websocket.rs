#![cfg(all(feature = "spot", feature = "usdm"))]
#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use binance_stream_client::endpoint::Environment;
use binance_stream_client::error::{Error, Kind};
use binance_stream_client::market::{AggTrade, DepthUpdate, Kline, UserDataEvent};
use binance_stream_client::spot::{PartialDepth, Trade};
use binance_stream_client::types::KlineInterval;
use binance_stream_client::ws::config::{Config, HeartbeatFailure};
use binance_stream_client::ws::{ConnectionState, Notice, NoticeKinds, WsError};
use binance_stream_client::{futures, spot};
use futures_util::{SinkExt as _, StreamExt as _};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

#[derive(Debug, Clone)]
enum Command {
    Text(String),
    Close,
}

/// Mock stream host.
struct MockWsServer {
    addr: SocketAddr,
    /// Commands for ALL connected clients
    command_tx: broadcast::Sender<Command>,
    /// Request paths of accepted handshakes
    path_rx: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Start a mock WebSocket server on a random port.
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (command_tx, _) = broadcast::channel::<Command>(100);
        let (path_tx, path_rx) = mpsc::unbounded_channel::<String>();
        let connections = Arc::new(AtomicUsize::new(0));

        let broadcast_tx = command_tx.clone();
        let accepted = Arc::clone(&connections);

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                // Subscribe before the handshake so nothing sent after it completes is lost
                let mut command_rx = broadcast_tx.subscribe();
                let path_tx = path_tx.clone();
                let callback = move |request: &Request, response: Response| {
                    drop(path_tx.send(request.uri().to_string()));
                    Ok::<_, ErrorResponse>(response)
                };

                let Ok(ws_stream) = tokio_tungstenite::accept_hdr_async(stream, callback).await
                else {
                    continue;
                };
                accepted.fetch_add(1, Ordering::SeqCst);

                let (mut write, mut read) = ws_stream.split();

                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                                    Some(Ok(_)) => {}
                                }
                            }
                            command = command_rx.recv() => {
                                match command {
                                    Ok(Command::Text(text)) => {
                                        if write.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(Command::Close) => {
                                        let frame = CloseFrame {
                                            code: CloseCode::Away,
                                            reason: "maintenance".into(),
                                        };
                                        drop(write.send(Message::Close(Some(frame))).await);
                                        break;
                                    }
                                    Err(_) => break,
                                }
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            command_tx,
            path_rx,
            connections,
        }
    }

    fn environment(&self) -> Environment {
        Environment::custom(&format!("ws://{}", self.addr)).unwrap()
    }

    /// Send a text frame to all connected clients.
    fn send(&self, message: &str) {
        drop(self.command_tx.send(Command::Text(message.to_owned())));
    }

    /// Close every open connection with a `1001 maintenance` close frame.
    fn close_all(&self) {
        drop(self.command_tx.send(Command::Close));
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Request path (and query) of the next accepted handshake.
    async fn recv_path(&mut self) -> Option<String> {
        timeout(Duration::from_secs(2), self.path_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Wait until `count` connections were accepted.
    async fn wait_for_connections(&self, count: usize) {
        timeout(Duration::from_secs(5), async {
            while self.connections() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.reconnect.max_attempts = Some(5);
    config.reconnect.initial_backoff = Duration::from_millis(50);
    config.reconnect.max_backoff = Duration::from_millis(200);
    config
}

/// Event and error callbacks that forward into channels.
fn channels<E: Send + 'static>() -> (
    impl FnMut(E) + Send + 'static,
    impl FnMut(Error) + Send + 'static,
    mpsc::UnboundedReceiver<E>,
    mpsc::UnboundedReceiver<Error>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    (
        move |event| drop(event_tx.send(event)),
        move |error| drop(error_tx.send(error)),
        event_rx,
        error_rx,
    )
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

/// Payloads as sent by the venue.
mod payloads {
    pub const AGG_TRADE: &str = r#"{"e":"aggTrade","E":123456789,"s":"BTCUSDT","a":5933014,
        "p":"0.001","q":"100","f":100,"l":105,"T":123456785,"m":true}"#;

    pub const LISTEN_KEY_EXPIRED: &str =
        r#"{"e":"listenKeyExpired","E":1576653824250,"listenKey":"key"}"#;

    pub const TRADE_LITE: &str = r#"{"e":"TRADE_LITE","E":1721895408092,"T":1721895408214,
        "s":"BTCUSDT","q":"0.001","p":"0","m":false,"c":"z8hcUoOsqEdKMeKPSABslD","S":"BUY",
        "L":"64089.20","l":"0.040","t":109100866,"i":8886774}"#;

    #[must_use]
    pub fn depth_envelope(stream: &str, first_update_id: i64) -> String {
        format!(
            r#"{{"stream":"{stream}","data":{{"e":"depthUpdate","E":123456789,
            "U":{first_update_id},"u":{},"b":[["0.0024","10"]],"a":[["0.0026","100"]]}}}}"#,
            first_update_id + 1
        )
    }

    #[must_use]
    pub fn kline_envelope(stream: &str) -> String {
        format!(
            r#"{{"stream":"{stream}","data":{{"e":"kline","E":1638747660000,"s":"BNBUSDT",
            "k":{{"t":1638747660000,"T":1638747719999,"s":"BNBUSDT","i":"1m","f":100,"L":200,
            "o":"0.0010","c":"0.0020","h":"0.0025","l":"0.0015","v":"1000","n":100,"x":false,
            "q":"1.0000","V":"500","Q":"0.500","B":"123456"}}}}}}"#
        )
    }
}

mod single_topic {
    use super::*;

    #[tokio::test]
    async fn dispatches_decoded_events() {
        let mut server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, _errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();
        assert_eq!(server.recv_path().await.unwrap(), "/ws/btcusdt@aggTrade");

        server.send(payloads::AGG_TRADE);
        let trade = recv(&mut events).await;
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.aggregate_trade_id, 5_933_014);

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn malformed_frame_is_reported_and_stream_continues() {
        let server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("btcusdt", on_event, on_error)
            .await
            .unwrap();

        server.send("{not json");
        server.send(payloads::AGG_TRADE);

        let error = recv(&mut errors).await;
        assert_eq!(error.kind(), Kind::WebSocket);
        assert!(matches!(
            error.downcast_ref::<WsError>(),
            Some(WsError::MessageParse(_))
        ));

        let trade = recv(&mut events).await;
        assert_eq!(trade.symbol, "BTCUSDT");
        assert!(errors.try_recv().is_err());
        assert!(handle.state().is_connected());

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn leveraged_token_streams_use_uppercase_names() {
        let mut server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();

        let (on_event, on_error, mut events, _errors) = channels::<futures::BlvtInfo>();
        let handle = client
            .serve_blvt_info("btcdown", on_event, on_error)
            .await
            .unwrap();
        assert_eq!(server.recv_path().await.unwrap(), "/ws/BTCDOWN@tokenNav");

        server.send(
            r#"{"e":"nav","E":1600245286000,"s":"BTCDOWN","m":4.5855,
            "b":[{"s":"BTCUSDT","n":-147.1955}],"n":9.36424112,"l":1.96,"t":2,"f":0.0015}"#,
        );
        let info = recv(&mut events).await;
        assert_eq!(info.symbol, "BTCDOWN");
        assert_eq!(info.baskets.len(), 1);
        handle.stop_and_wait().await;

        let (on_event, on_error, _events, _errors) = channels::<futures::BlvtKline>();
        let handle = client
            .serve_blvt_kline("btcdown", KlineInterval::OneHour, on_event, on_error)
            .await
            .unwrap();
        assert_eq!(
            server.recv_path().await.unwrap(),
            "/ws/BTCDOWN@nav_Kline_1h"
        );
        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn user_data_drops_trade_lite() {
        let mut server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, _errors) = channels::<UserDataEvent>();

        let handle = client
            .serve_user_data("listen-key", on_event, on_error)
            .await
            .unwrap();
        assert_eq!(server.recv_path().await.unwrap(), "/ws/listen-key");

        server.send(payloads::TRADE_LITE);
        server.send(payloads::LISTEN_KEY_EXPIRED);

        let event = recv(&mut events).await;
        assert!(matches!(
            event,
            UserDataEvent::ListenKeyExpired(_)
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(events.try_recv().is_err());

        handle.stop_and_wait().await;
    }
}

mod combined {
    use super::*;

    #[tokio::test]
    async fn depth_updates_carry_envelope_symbol() {
        let mut server = MockWsServer::start().await;
        let client = spot::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, mut errors) = channels::<DepthUpdate>();

        let handle = client
            .serve_combined_diff_depth(&["BTCUSDT", "ETHUSDT"], on_event, on_error)
            .await
            .unwrap();
        assert_eq!(
            server.recv_path().await.unwrap(),
            "/stream?streams=btcusdt@depth/ethusdt@depth"
        );

        server.send(r#"{"stream":"btcusdt@depth5","data":{"lastUpdateId":1,"bids":[],"asks":[]}}"#);
        server.send(&payloads::depth_envelope("btcusdt@depth", 157));
        server.send(&payloads::depth_envelope("ethusdt@depth", 160));

        let first = recv(&mut events).await;
        let second = recv(&mut events).await;
        assert_eq!(first.symbol, "BTCUSDT");
        assert_eq!(first.first_update_id, 157);
        assert_eq!(second.symbol, "ETHUSDT");
        assert_eq!(second.bids.len(), 1);
        assert!(errors.try_recv().is_err());

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn frames_of_other_topics_are_dropped() {
        let server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, mut errors) = channels::<Kline>();

        let handle = client
            .serve_combined_kline(&[("BNBUSDT", KlineInterval::OneMinute)], on_event, on_error)
            .await
            .unwrap();

        server.send(&payloads::depth_envelope("bnbusdt@depth", 1));
        server.send(&payloads::kline_envelope("bnbusdt@kline_1m"));

        let kline = recv(&mut events).await;
        assert_eq!(kline.symbol, "BNBUSDT");
        assert_eq!(kline.kline.symbol, "BNBUSDT");
        assert_eq!(kline.kline.interval, KlineInterval::OneMinute);
        assert!(errors.try_recv().is_err());

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn partial_depth_symbol_is_backfilled() {
        let server = MockWsServer::start().await;
        let client = spot::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, _errors) = channels::<PartialDepth>();

        let handle = client
            .serve_combined_partial_depth(&[("BNBBTC", 5)], on_event, on_error)
            .await
            .unwrap();

        server.send(
            r#"{"stream":"bnbbtc@depth5","data":{"lastUpdateId":160,
            "bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}}"#,
        );

        let depth = recv(&mut events).await;
        assert_eq!(depth.symbol, "BNBBTC");
        assert_eq!(depth.last_update_id, 160);

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn rejects_invalid_parameters_without_connecting() {
        let server = MockWsServer::start().await;
        let client = spot::Client::new(server.environment(), config()).unwrap();

        let (on_event, on_error, _events, _errors) = channels::<PartialDepth>();
        let err = client
            .serve_combined_partial_depth(&[("BNBBTC", 7)], on_event, on_error)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);

        let (on_event, on_error, _events, _errors) = channels::<Trade>();
        let err = client
            .serve_combined_trade(&[], on_event, on_error)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(server.connections(), 0);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn first_handshake_failure_is_returned() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let environment = Environment::custom(&format!("ws://{addr}")).unwrap();
        let client = futures::Client::new(environment, config()).unwrap();
        let (on_event, on_error, _events, _errors) = channels::<AggTrade>();

        let err = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::WebSocket);
    }

    #[tokio::test]
    async fn stop_returns_promptly_and_silences_callbacks() {
        let server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();

        timeout(Duration::from_secs(5), handle.stop_and_wait())
            .await
            .unwrap();
        assert!(handle.is_done());
        assert!(handle.state().is_closed());

        server.send(payloads::AGG_TRADE);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(events.try_recv().is_err());
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_stream() {
        let server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, _events, _errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();
        let done = handle.done_token();
        drop(handle);

        timeout(Duration::from_secs(5), done.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_close_reports_once_and_reconnects() {
        let server = MockWsServer::start().await;
        let client = futures::Client::new(server.environment(), config()).unwrap();
        let (on_event, on_error, mut events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();
        server.wait_for_connections(1).await;

        server.close_all();
        let error = recv(&mut errors).await;
        assert!(matches!(
            error.downcast_ref::<WsError>(),
            Some(WsError::ConnectionClosed {
                code: Some(1001),
                ..
            })
        ));

        server.wait_for_connections(2).await;
        let mut status = handle.status_receiver();
        timeout(
            Duration::from_secs(2),
            status.wait_for(|status| status.state.is_connected()),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(handle.reconnects() >= 1);

        server.send(payloads::AGG_TRADE);
        let trade = recv(&mut events).await;
        assert_eq!(trade.symbol, "BTCUSDT");
        assert!(errors.try_recv().is_err());

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn closes_when_reconnect_is_disabled() {
        let server = MockWsServer::start().await;
        let mut config = config();
        config.reconnect.enabled = false;
        let client = futures::Client::new(server.environment(), config).unwrap();
        let (on_event, on_error, _events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();
        server.wait_for_connections(1).await;

        server.close_all();
        timeout(Duration::from_secs(2), handle.done())
            .await
            .unwrap();

        assert_eq!(handle.state(), ConnectionState::Closed);
        assert_eq!(handle.reconnects(), 0);
        let _closed: Error = recv(&mut errors).await;
        assert_eq!(server.connections(), 1);
    }

    #[tokio::test]
    async fn notices_report_connect_and_close() {
        let server = MockWsServer::start().await;
        let (notice_tx, mut notices) = mpsc::unbounded_channel();
        let client = futures::Client::new(server.environment(), config())
            .unwrap()
            .with_notices(move |notice| drop(notice_tx.send(notice)));
        let (on_event, on_error, _events, _errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();

        let Notice::Connected { url } = recv(&mut notices).await else {
            panic!("expected a connected notice");
        };
        assert!(url.ends_with("/ws/btcusdt@aggTrade"));

        server.close_all();
        let Notice::Closed { code, reason } = recv(&mut notices).await else {
            panic!("expected a closed notice");
        };
        assert_eq!(code, Some(1001));
        assert_eq!(reason, "maintenance");

        assert!(matches!(recv(&mut notices).await, Notice::Connected { .. }));

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        // Accepts one session, closes it and stops listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(listener);
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            drop(closed_rx.await);
            let frame = CloseFrame {
                code: CloseCode::Away,
                reason: "maintenance".into(),
            };
            drop(ws.send(Message::Close(Some(frame))).await);
            while let Some(Ok(_)) = ws.next().await {}
        });

        let environment = Environment::custom(&format!("ws://{addr}")).unwrap();
        let mut config = config();
        config.reconnect.max_attempts = Some(2);
        let client = futures::Client::new(environment, config).unwrap();
        let (on_event, on_error, _events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();
        closed_tx.send(()).unwrap();

        timeout(Duration::from_secs(5), handle.done())
            .await
            .unwrap();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert_eq!(handle.reconnects(), 2);

        let closed = recv(&mut errors).await;
        assert!(matches!(
            closed.downcast_ref::<WsError>(),
            Some(WsError::ConnectionClosed { .. })
        ));
        for _ in 0..2 {
            let refused = recv(&mut errors).await;
            assert!(matches!(
                refused.downcast_ref::<WsError>(),
                Some(WsError::Connection(_))
            ));
        }
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn keepalive_pings_reach_the_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (ping_tx, mut pings) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Reading answers each ping with a pong
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Ping(_) = message {
                    drop(ping_tx.send(()));
                }
            }
        });

        let environment = Environment::custom(&format!("ws://{addr}")).unwrap();
        let mut config = config();
        config.heartbeat.interval = Duration::from_millis(100);
        config.heartbeat.pong_timeout = Some(Duration::from_millis(500));
        config.heartbeat.on_failure = HeartbeatFailure::Reconnect;
        config.notices = NoticeKinds::ALL;
        let (notice_tx, mut notices) = mpsc::unbounded_channel();
        let client = futures::Client::new(environment, config)
            .unwrap()
            .with_notices(move |notice| drop(notice_tx.send(notice)));
        let (on_event, on_error, _events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();

        for _ in 0..3 {
            recv(&mut pings).await;
        }
        let mut sent = 0;
        while sent < 3 {
            if recv(&mut notices).await == Notice::KeepaliveSent {
                sent += 1;
            }
        }
        assert!(errors.try_recv().is_err());
        assert!(handle.state().is_connected());
        assert_eq!(handle.reconnects(), 0);

        handle.stop_and_wait().await;
    }

    #[tokio::test]
    async fn silent_peer_trips_pong_watchdog_and_reconnects() {
        // Completes handshakes, then never reads, so pings go unanswered
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    held.push(ws);
                }
            }
        });

        let environment = Environment::custom(&format!("ws://{addr}")).unwrap();
        let mut config = config();
        config.heartbeat.interval = Duration::from_millis(100);
        config.heartbeat.pong_timeout = Some(Duration::from_millis(100));
        config.heartbeat.on_failure = HeartbeatFailure::Reconnect;
        let client = futures::Client::new(environment, config).unwrap();
        let (on_event, on_error, _events, mut errors) = channels::<AggTrade>();

        let handle = client
            .serve_agg_trade("BTCUSDT", on_event, on_error)
            .await
            .unwrap();

        let error = recv(&mut errors).await;
        assert!(matches!(
            error.downcast_ref::<WsError>(),
            Some(WsError::HeartbeatTimeout)
        ));

        timeout(Duration::from_secs(2), async {
            while accepted.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(handle.reconnects() >= 1);

        handle.stop_and_wait().await;
        assert!(handle.state().is_closed());
    }
}
