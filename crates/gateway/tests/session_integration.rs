//! Integration test: login, keepalive, redial and replay against an
//! in-process exchange socket

mod common;

use common::{MockExchange, eventually};
use okws_core::{CurrencyFilter, InstrumentId};
use okws_gateway::{AuthStatus, ClientConfig, Credentials, GatewayError, WsClient};
use std::time::Duration;
use tokio::sync::mpsc;

const LOGIN_OK: &str = r#"{"event":"login","code":"0","msg":"","connId":"a4d3ae55"}"#;

fn with_credentials(config: ClientConfig) -> ClientConfig {
    config.with_credentials(Credentials::new("key", "secret", "phrase"))
}

#[tokio::test]
async fn test_login_is_throttled() {
    let _ = env_logger::try_init();
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(with_credentials(exchange.config())).unwrap();

    client.login().await.unwrap();
    client.login().await.unwrap();

    let (conn, op) = exchange.next_op().await;
    assert_eq!(conn, 0);
    assert_eq!(op["op"], "login");
    let arg = &op["args"][0];
    assert_eq!(arg["apiKey"], "key");
    assert_eq!(arg["passphrase"], "phrase");
    assert!(arg["timestamp"].as_str().is_some_and(|t| t.parse::<i64>().is_ok()));
    assert!(arg["sign"].as_str().is_some_and(|s| !s.is_empty()));

    assert!(exchange.quiet_for(Duration::from_millis(300)).await);
    assert_eq!(client.auth_status(), Some(AuthStatus::Pending));
}

#[tokio::test]
async fn test_login_without_credentials_fails() {
    let exchange = MockExchange::start().await;
    let client = WsClient::new(exchange.config()).unwrap();

    assert!(matches!(client.login().await, Err(GatewayError::MissingCredentials)));
    assert!(client.auth_status().is_none());
    assert_eq!(exchange.connection_count(), 0);
}

#[tokio::test]
async fn test_stale_confirmation_triggers_fresh_login() {
    let mut exchange = MockExchange::start().await;
    let mut config = with_credentials(exchange.config());
    config.login_throttle_ms = 200;
    let client = WsClient::new(config).unwrap();
    let (login_tx, mut login_rx) = mpsc::channel(4);
    client.set_login_sink(login_tx);

    client.login().await.unwrap();
    let (_, first) = exchange.next_op().await;
    assert_eq!(first["op"], "login");

    tokio::time::sleep(Duration::from_millis(300)).await;
    exchange.push(LOGIN_OK);

    let (_, second) = exchange.next_op().await;
    assert_eq!(second["op"], "login");
    assert!(!client.is_authorized());
    assert!(login_rx.try_recv().is_err());

    // answered promptly this time
    exchange.push(LOGIN_OK);
    assert!(eventually(|| client.is_authorized()).await);
    let event = login_rx.recv().await.unwrap();
    assert_eq!(event.code, 0);
    assert_eq!(event.conn_id.as_deref(), Some("a4d3ae55"));
}

#[tokio::test]
async fn test_rejected_login_is_reported() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(with_credentials(exchange.config())).unwrap();
    let (login_tx, mut login_rx) = mpsc::channel(4);
    client.set_login_sink(login_tx);

    client.login().await.unwrap();
    exchange.next_op().await;
    exchange.push(r#"{"event":"login","code":"60009","msg":"Login failed."}"#);

    let event = login_rx.recv().await.unwrap();
    assert_eq!(event.code, 60009);
    assert_eq!(client.auth_status(), Some(AuthStatus::Unauthenticated));
}

#[tokio::test]
async fn test_restricted_subscribe_logs_in_first() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(with_credentials(exchange.config())).unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    let subscriber = client.clone();
    let handle = tokio::spawn(async move {
        subscriber
            .private()
            .account(CurrencyFilter::currency("BTC"), Some(tx))
            .await
    });

    let (_, login) = exchange.next_op().await;
    assert_eq!(login["op"], "login");
    exchange.push(LOGIN_OK);

    let (conn, sub) = exchange.next_op().await;
    assert_eq!(conn, 0);
    assert_eq!(sub["op"], "subscribe");
    assert_eq!(sub["args"][0]["channel"], "account");
    assert_eq!(sub["args"][0]["ccy"], "BTC");
    handle.await.unwrap().unwrap();

    exchange.push(
        r#"{"arg":{"channel":"account","ccy":"BTC"},"data":[{"uTime":"1597026383085","totalEq":"41624.32","details":[]}]}"#,
    );
    let push = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.arg.get("ccy"), Some("BTC"));
    assert!(push.data[0].total_eq.is_some());
}

#[tokio::test]
async fn test_redial_replays_only_latest_operation() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(exchange.config()).unwrap();

    client
        .public()
        .tickers(&[InstrumentId::new("BTC-USDT")], None)
        .await
        .unwrap();
    client
        .public()
        .tickers(&[InstrumentId::new("ETH-USDT")], None)
        .await
        .unwrap();
    assert_eq!(exchange.next_op().await.1["args"][0]["instId"], "BTC-USDT");
    assert_eq!(exchange.next_op().await.1["args"][0]["instId"], "ETH-USDT");

    exchange.drop_connection();

    let (conn, op) = exchange.next_op().await;
    assert_eq!(conn, 1);
    assert_eq!(op["op"], "subscribe");
    assert_eq!(op["args"][0]["instId"], "ETH-USDT");
    assert!(exchange.quiet_for(Duration::from_millis(300)).await);
    let subscribed = client.subscriptions(false);
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].get("instId"), Some("ETH-USDT"));
}

#[tokio::test]
async fn test_submit_blocked_during_redial_is_sent_once() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(exchange.config()).unwrap();
    let ticker = |id: &str| [InstrumentId::new(id)];

    client.public().tickers(&ticker("BTC-USDT"), None).await.unwrap();
    assert_eq!(exchange.next_op().await.1["args"][0]["instId"], "BTC-USDT");

    exchange.set_accept_delay(Duration::from_millis(800));
    exchange.drop_connection();
    assert!(eventually(|| exchange.dial_count() >= 2).await);

    // fills the queue while the new handshake is held open
    for id in ["ETH-USDT", "SOL-USDT", "XRP-USDT"] {
        client.public().tickers(&ticker(id), None).await.unwrap();
    }
    let blocked = {
        let client = client.clone();
        tokio::spawn(async move { client.public().tickers(&ticker("DOGE-USDT"), None).await })
    };

    let (conn, op) = exchange.next_op().await;
    assert_eq!(conn, 1);
    assert_eq!(op["args"][0]["instId"], "DOGE-USDT");
    assert!(exchange.quiet_for(Duration::from_millis(500)).await);
    blocked.await.unwrap().unwrap();

    let subscribed = client.subscriptions(false);
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].get("instId"), Some("DOGE-USDT"));
}

#[tokio::test]
async fn test_redial_logs_in_before_replay() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(with_credentials(exchange.config())).unwrap();

    let subscriber = client.clone();
    let handle = tokio::spawn(async move {
        subscriber
            .private()
            .balance_and_position(None)
            .await
    });
    exchange.next_op().await;
    exchange.push(LOGIN_OK);
    let (_, sub) = exchange.next_op().await;
    assert_eq!(sub["args"][0]["channel"], "balance_and_position");
    handle.await.unwrap().unwrap();
    assert!(client.is_authorized());

    exchange.drop_connection();

    let (conn, login) = exchange.next_op().await;
    assert_eq!(conn, 1);
    assert_eq!(login["op"], "login");
    assert!(!client.is_authorized());
    exchange.push(LOGIN_OK);

    let (conn, replay) = exchange.next_op().await;
    assert_eq!(conn, 1);
    assert_eq!(replay["op"], "subscribe");
    assert_eq!(replay["args"][0]["channel"], "balance_and_position");
    assert!(client.is_authorized());
}

#[tokio::test]
async fn test_keepalive_ping_holds_connection() {
    let mut exchange = MockExchange::start().await;
    let mut config = exchange.config();
    config.pong_wait_ms = 1_000;
    let client = WsClient::new(config).unwrap();

    client
        .public()
        .index_tickers(&[InstrumentId::new("BTC-USDT")], None)
        .await
        .unwrap();
    exchange.next_op().await;

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(exchange.ping_count() >= 2);
    assert_eq!(exchange.connection_count(), 1);
}

#[tokio::test]
async fn test_silent_server_hits_read_deadline() {
    let mut exchange = MockExchange::start_with(false).await;
    let mut config = exchange.config();
    config.pong_wait_ms = 400;
    let client = WsClient::new(config).unwrap();

    client
        .public()
        .funding_rate(&[InstrumentId::new("BTC-USD-SWAP")], None)
        .await
        .unwrap();
    assert_eq!(exchange.next_op().await.0, 0);

    let (conn, op) = exchange.next_op().await;
    assert!(conn >= 1);
    assert_eq!(op["args"][0]["channel"], "funding-rate");
}

#[tokio::test]
async fn test_shutdown_stops_redial() {
    let mut exchange = MockExchange::start().await;
    let client = WsClient::new(exchange.config()).unwrap();

    client
        .public()
        .tickers(&[InstrumentId::new("BTC-USDT")], None)
        .await
        .unwrap();
    exchange.next_op().await;

    client.shutdown();
    exchange.drop_connection();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(client.is_shut_down());
    assert_eq!(exchange.connection_count(), 1);
    let err = client
        .public()
        .tickers(&[InstrumentId::new("ETH-USDT")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Cancelled));
}
