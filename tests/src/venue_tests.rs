//! Venue drivers behind the trading interface, over fake transports
//!
//! `ScriptedTransport` replays canned venue payloads by route; the mockall transport
//! is used where a test needs to pin the exact number of calls.

use async_trait::async_trait;
use mockall::mock;
use multivenue_core::prelude::*;
use multivenue_exchanges::huobi::HuobiDriver;
use multivenue_exchanges::prelude::*;
use multivenue_exchanges::testing::ScriptedTransport;
use multivenue_exchanges::{HttpRequest, HttpResponse, Method};
use rstest::*;
use std::rc::Rc;
use std::time::Duration;

mock! {
    pub Wire {}

    #[async_trait(?Send)]
    impl Transport for Wire {
        async fn perform(&self, request: HttpRequest) -> Result<HttpResponse>;
    }
}

const HUOBI_TICK: &str =
    r#"{"status":"ok","tick":{"close":6500,"high":6600,"low":6400,"vol":1200,"bid":[6499,1],"ask":[6501,1]}}"#;

fn pair(base: &str, quote: &str) -> TradingPair {
    TradingPair::new(base, quote).unwrap()
}

fn okex_credentials() -> Credentials {
    Credentials::new("okex-key", "okex-secret").with_passphrase("pass")
}

#[fixture]
fn transport() -> Rc<ScriptedTransport> {
    Rc::new(ScriptedTransport::new())
}

fn interface_over(transport: &Rc<ScriptedTransport>, config: ExchangesConfig) -> TradingInterface {
    TradingInterface::with_transport(&config, transport.clone()).unwrap()
}

fn all_venues() -> ExchangesConfig {
    ExchangesConfig::default()
        .with_venue(VenueConfig::huobi().with_credentials(Credentials::new("huobi-key", "huobi-secret")))
        .with_venue(VenueConfig::localbitcoins().with_credentials(Credentials::new("lb-key", "lb-secret")))
        .with_venue(VenueConfig::okex().with_credentials(okex_credentials()))
}

// ============================================================================
// MOCKED TRANSPORT
// ============================================================================

#[cfg(test)]
mod mocked_transport {
    use super::*;

    #[monoio::test(timer_enabled = true)]
    async fn test_cached_ticker_dispatches_once() {
        let mut wire = MockWire::new();
        wire.expect_perform()
            .withf(|request| {
                request.url.host_str() == Some("api.huobi.pro") && request.url.path() == "/market/detail/merged"
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, HUOBI_TICK)));

        let config = VenueConfig::huobi().with_base_url("https://api.huobi.pro");
        let driver = HuobiDriver::new(&config, Rc::new(wire)).unwrap();
        let first = driver.fetch_ticker(&pair("BTC", "USDT"), MarketType::Spot).await.unwrap();
        let second = driver.fetch_ticker(&pair("BTC", "USDT"), MarketType::Spot).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.last, Fixed::from_i64(6500));
        assert_eq!(driver.dispatch_stats().dispatched, 1);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_transport_failure_is_retryable_and_not_cached() {
        let mut wire = MockWire::new();
        let mut seq = mockall::Sequence::new();
        wire.expect_perform()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ExchangeError::Transport("connection reset by peer".into())));
        wire.expect_perform()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, HUOBI_TICK)));

        let driver = HuobiDriver::new(&VenueConfig::huobi(), Rc::new(wire)).unwrap();
        let err = driver.fetch_ticker(&pair("BTC", "USDT"), MarketType::Spot).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Retryable);

        assert!(driver.fetch_ticker(&pair("BTC", "USDT"), MarketType::Spot).await.is_ok());
        let stats = driver.dispatch_stats();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.transport_errors, 1);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_unsigned_private_call_never_reaches_the_wire() {
        let mut wire = MockWire::new();
        wire.expect_perform().never();

        let driver = HuobiDriver::new(&VenueConfig::huobi(), Rc::new(wire)).unwrap();
        let err = driver.get_account_info().await.unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCredentials(_)));
    }
}

// ============================================================================
// TRADING INTERFACE
// ============================================================================

#[cfg(test)]
mod trading_interface {
    use super::*;

    #[rstest]
    #[case("huobi")]
    #[case("localbitcoins")]
    #[case("okex")]
    #[monoio::test(timer_enabled = true)]
    async fn test_unsupported_operations(transport: Rc<ScriptedTransport>, #[case] venue: &str) {
        let interface = interface_over(&transport, all_venues());
        let driver = interface.driver(venue).unwrap();

        let err = driver.deposit_address("BTC").await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Unsupported);
        assert!(driver.withdraw_fiat("USD", Fixed::ONE).await.unwrap_err().is_not_supported());
        assert!(driver.funding_history().await.unwrap_err().is_not_supported());
        assert!(!driver.supports_websocket());
        assert_eq!(transport.total(), 0);
    }

    #[rstest]
    #[case("huobi", "0.002", "0.001")]
    #[case("localbitcoins", "0.01", "0.005")]
    #[case("okex", "0.0015", "0.001")]
    fn test_fee_rates_per_venue(
        transport: Rc<ScriptedTransport>,
        #[case] venue: &str,
        #[case] taker: &str,
        #[case] maker: &str,
    ) {
        let interface = interface_over(&transport, all_venues());
        let request = FeeRequest::trade(&pair("BTC", "USD"), Fixed::ONE, Fixed::ONE, false);

        assert_eq!(interface.get_fee(venue, &request).unwrap(), Fixed::from_str_exact(taker).unwrap());
        let maker_request = FeeRequest { is_maker: true, ..request };
        assert_eq!(interface.get_fee(venue, &maker_request).unwrap(), Fixed::from_str_exact(maker).unwrap());
    }

    #[rstest]
    #[monoio::test(timer_enabled = true)]
    async fn test_disabled_venue_is_not_built(transport: Rc<ScriptedTransport>) {
        let config = ExchangesConfig::from_json_str(
            r#"{"venues":[{"name":"okex","enabled":false},{"name":"huobi"}]}"#,
        )
        .unwrap();
        let interface = interface_over(&transport, config);

        let err = interface.fetch_ticker("okex", &pair("LTC", "BTC"), MarketType::Spot).await.unwrap_err();
        assert!(matches!(err, ExchangeError::VenueDisabled(_)));
        assert!(matches!(interface.get_account_info("bitstamp").await, Err(ExchangeError::VenueNotFound(_))));
        assert_eq!(transport.total(), 0);
    }

    #[rstest]
    #[monoio::test(timer_enabled = true)]
    async fn test_timed_out_placement_is_unknown_and_timed_out_read_is_retryable(transport: Rc<ScriptedTransport>) {
        transport.delayed(Method::Post, "/api/spot/v3/orders", Duration::from_millis(300), r#"{"order_id":"1","result":true}"#);
        transport.delayed(
            Method::Get,
            "/api/spot/v3/instruments/LTC-BTC/ticker",
            Duration::from_millis(300),
            r#"{"last":"0.0086"}"#,
        );
        let config = ExchangesConfig::default().with_venue(
            VenueConfig::okex()
                .with_credentials(okex_credentials())
                .with_timeout(Duration::from_millis(50)),
        );
        let interface = interface_over(&transport, config);

        let order = OrderRequest::limit(pair("LTC", "BTC"), OrderSide::Sell, Fixed::ONE, Fixed::from_str_exact("0.009").unwrap());
        let err = interface.submit_order("okex", &order).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Ambiguous);

        let err = interface.fetch_ticker("okex", &pair("LTC", "BTC"), MarketType::Spot).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Timeout(_)));
        assert_eq!(err.class(), ErrorClass::Retryable);

        let stats = interface.dispatch_stats("okex").unwrap();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.timeouts, 2);
    }

    #[rstest]
    #[monoio::test(timer_enabled = true)]
    async fn test_cancel_all_through_interface(transport: Rc<ScriptedTransport>) {
        transport.json(
            Method::Get,
            "/api/spot/v3/orders_pending",
            r#"[{"order_id":"1","instrument_id":"LTC-BTC"},{"order_id":"2","instrument_id":"LTC-BTC"},{"order_id":"3","instrument_id":"LTC-BTC"}]"#,
        );
        transport.json(Method::Post, "/api/spot/v3/cancel_orders/1", r#"{"order_id":"1","result":true}"#);
        transport.json(
            Method::Post,
            "/api/spot/v3/cancel_orders/2",
            r#"{"order_id":"2","result":false,"error_code":"33014","error_message":"Order does not exist"}"#,
        );
        transport.json(Method::Post, "/api/spot/v3/cancel_orders/3", r#"{"order_id":"3","result":true}"#);
        let interface = interface_over(&transport, all_venues());

        let result = interface
            .cancel("okex", &CancellationRequest::AllForPair(pair("LTC", "BTC")))
            .await
            .unwrap();

        assert_eq!(result.attempted(), 3);
        assert_eq!(result.cancelled().count(), 2);
        let failures: Vec<_> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "2");
        assert!(failures[0].1.contains("33014"));
    }

    #[rstest]
    #[monoio::test(timer_enabled = true)]
    async fn test_refresh_keeps_last_good_pair_list(transport: Rc<ScriptedTransport>) {
        transport.json(
            Method::Get,
            "/api/spot/v3/instruments",
            r#"[{"instrument_id":"LTC-BTC","base_currency":"LTC","quote_currency":"BTC"}]"#,
        );
        transport.status(Method::Get, "/api/spot/v3/instruments", 503, r#"{"code":30001,"message":"maintenance"}"#);
        let config = ExchangesConfig::default().with_venue(VenueConfig::okex());
        let interface = interface_over(&transport, config);

        let first = interface.refresh_tradable_pairs(MarketType::Spot).await;
        assert!(first["okex"].is_ok());

        let second = interface.refresh_tradable_pairs(MarketType::Spot).await;
        assert_eq!(second["okex"], Err(ExchangeError::venue("30001", "maintenance")));
        assert_eq!(interface.enabled_pairs("okex").unwrap(), vec![pair("LTC", "BTC")]);
    }

    #[rstest]
    #[monoio::test(timer_enabled = true)]
    async fn test_margin_market_is_not_supported(transport: Rc<ScriptedTransport>) {
        let interface = interface_over(&transport, all_venues());
        let outcomes = interface.refresh_tradable_pairs(MarketType::Margin).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.values().all(|o| o.as_ref().is_err_and(|e| e.is_not_supported())));
        assert_eq!(transport.total(), 0);
    }
}
