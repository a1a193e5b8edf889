//! HuobiHadax spot driver
//!
//! Orders need the numeric spot account id. It is resolved on first use and cached
//! for the driver's lifetime; concurrent first users share one lookup.

pub mod auth;
pub mod types;

use crate::config::VenueConfig;
use crate::decode::{price_amount, Num};
use crate::dispatcher::DispatchStatsSnapshot;
use crate::errors::{ExchangeError, Result};
use crate::fees::FeeSchedule;
use crate::http::Method;
use crate::rate_limit::Channel;
use crate::single_flight::AsyncOnce;
use crate::traits::{RequestSigner, Transport, VenueDriver};
use crate::types::*;
use crate::venue::{cancel_each, collect_pairs, OrderTypeTable, VenueCore, VenueProfile};
use async_trait::async_trait;
use multivenue_core::{log_order, Fixed, Timestamp};
use std::rc::Rc;
use tracing::info;

pub use auth::HuobiSigner;
use types::*;

pub const NAME: &str = "huobi";
pub const BASE_URL: &str = "https://api.hadax.com";

const SPOT_ONLY: &[MarketType] = &[MarketType::Spot];

pub struct HuobiDriver {
    core: VenueCore,
    order_types: OrderTypeTable<&'static str>,
    account_id: AsyncOnce<String>,
}

impl HuobiDriver {
    pub fn new(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Self> {
        let signer = match &config.credentials {
            Some(credentials) => Some(Box::new(HuobiSigner::new(credentials.clone())?) as Box<dyn RequestSigner>),
            None => None,
        };
        let core = VenueCore::new(Self::profile(), config, transport, signer)?;

        Ok(Self {
            core,
            order_types: OrderTypeTable::new(&[
                ((OrderSide::Buy, OrderType::Market), "buy-market"),
                ((OrderSide::Sell, OrderType::Market), "sell-market"),
                ((OrderSide::Buy, OrderType::Limit), "buy-limit"),
                ((OrderSide::Sell, OrderType::Limit), "sell-limit"),
            ]),
            account_id: AsyncOnce::new(),
        })
    }

    pub fn profile() -> VenueProfile {
        VenueProfile {
            name: NAME,
            default_base_url: BASE_URL,
            markets: SPOT_ONLY,
            request_format: PairFormat::new("", false),
            config_format: PairFormat::dashed_upper(),
            fees: FeeSchedule::new(NAME, Fixed::from_scaled(2, 3), Fixed::from_scaled(1, 3)).with_withdrawal_fees(&[
                ("BTC", Fixed::from_scaled(1, 3)),
                ("ETH", Fixed::from_scaled(1, 2)),
                ("LTC", Fixed::from_scaled(1, 3)),
                ("BCH", Fixed::from_scaled(1, 4)),
                ("USDT", Fixed::from_i64(2)),
                ("HT", Fixed::ONE),
            ]),
            withdraw_permissions: WithdrawPermissions::AUTO_WITHDRAW_CRYPTO_WITH_SETUP,
        }
    }

    /// Spot account id, looked up once per driver
    pub async fn account_id(&self) -> Result<String> {
        self.account_id
            .get_or_try_init(|| async {
                let accounts: Envelope<Vec<Account>> =
                    self.core.get_json(Channel::Authenticated, "/v1/account/accounts", &[]).await?;
                let accounts = accounts.into_result()?;

                let account = accounts
                    .iter()
                    .find(|a| a.account_type == "spot")
                    .or_else(|| accounts.first())
                    .ok_or_else(|| ExchangeError::InvalidResponse("no huobi account id returned".to_string()))?;

                info!("🔑 huobi account id resolved: {} ({})", account.id, account.state);
                Ok(account.id.to_string())
            })
            .await
    }

    async fn load_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        let detail: Envelope<MergedDetail> = self
            .core
            .get_json(Channel::Public, "/market/detail/merged", &[("symbol", self.core.symbol(pair))])
            .await?;
        let detail = detail.into_result()?;

        Ok(TickerSnapshot {
            venue: NAME.to_string(),
            pair: pair.clone(),
            market_type: market,
            last: detail.close,
            bid: detail.bid.first().map(|n| n.0).unwrap_or(Fixed::ZERO),
            ask: detail.ask.first().map(|n| n.0).unwrap_or(Fixed::ZERO),
            volume: detail.vol,
            high: detail.high,
            low: detail.low,
            captured_at: Timestamp::now(),
        })
    }

    async fn load_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        let depth: Envelope<Depth> = self
            .core
            .get_json(
                Channel::Public,
                "/market/depth",
                &[("symbol", self.core.symbol(pair)), ("type", "step0".to_string())],
            )
            .await?;
        let depth = depth.into_result()?;

        let levels = |rows: &[Vec<Num>]| -> Vec<BookLevel> {
            rows.iter()
                .filter_map(|row| price_amount(row))
                .map(|(price, amount)| BookLevel::new(price, amount))
                .collect()
        };

        Ok(OrderBookSnapshot::new(NAME, pair.clone(), market, levels(&depth.bids), levels(&depth.asks)))
    }

    async fn open_order_ids(&self, pair: &TradingPair) -> Result<Vec<String>> {
        let account_id = self.account_id().await?;
        let symbol = self.core.symbol(pair);
        let orders: Envelope<Vec<OpenOrder>> = self
            .core
            .get_json(
                Channel::Authenticated,
                "/v1/order/openOrders",
                &[("account-id", account_id), ("symbol", symbol.clone()), ("size", "500".to_string())],
            )
            .await?;

        Ok(orders
            .into_result()?
            .into_iter()
            .filter(|o| o.symbol == symbol)
            .map(|o| o.id)
            .collect())
    }
}

#[async_trait(?Send)]
impl VenueDriver for HuobiDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn supported_market_types(&self) -> &[MarketType] {
        SPOT_ONLY
    }

    fn request_format(&self) -> &PairFormat {
        &self.core.profile().request_format
    }

    fn config_format(&self) -> &PairFormat {
        &self.core.profile().config_format
    }

    async fn fetch_tradable_pairs(&self, market: MarketType) -> Result<Vec<TradingPair>> {
        self.core.ensure_market(market)?;
        let symbols: Envelope<Vec<Symbol>> =
            self.core.get_json(Channel::Public, "/v1/hadax/common/symbols", &[]).await?;
        let symbols = symbols.into_result()?;

        Ok(collect_pairs(
            NAME,
            symbols.iter().map(|s| (s.base_currency.as_str(), s.quote_currency.as_str())),
        ))
    }

    async fn fetch_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        self.core.ticker(pair, market, false, || self.load_ticker(pair, market)).await
    }

    async fn update_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        self.core.ticker(pair, market, true, || self.load_ticker(pair, market)).await
    }

    async fn fetch_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        self.core.order_book(pair, market, false, || self.load_order_book(pair, market)).await
    }

    async fn update_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        self.core.order_book(pair, market, true, || self.load_order_book(pair, market)).await
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        let account_id = self.account_id().await?;
        let path = format!("/v1/hadax/account/accounts/{account_id}/balance");
        let sheet: Envelope<BalanceSheet> = self.core.get_json(Channel::Authenticated, &path, &[]).await?;

        // Fold (currency, trade|frozen) rows into one balance per currency, in first-seen order.
        let mut balances: Vec<AccountBalance> = Vec::new();
        for row in sheet.into_result()?.list {
            let currency = row.currency.to_uppercase();
            let idx = match balances.iter().position(|b| b.currency == currency) {
                Some(idx) => idx,
                None => {
                    balances.push(AccountBalance::new(currency, Fixed::ZERO, Fixed::ZERO));
                    balances.len() - 1
                }
            };
            let amount = row.balance.non_negative();
            match row.kind.as_str() {
                "trade" => balances[idx].available += amount,
                _ => balances[idx].held += amount,
            }
        }

        Ok(AccountInfo {
            venue: NAME.to_string(),
            balances,
        })
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        order.validate()?;
        let order_type = self.order_types.lookup(order.side, order.order_type)?;
        let account_id = self.account_id().await?;

        let body = PlaceOrder {
            account_id,
            amount: order.amount.to_canonical_string(),
            price: order.effective_price().map(|p| p.to_canonical_string()),
            source: "api",
            symbol: self.core.symbol(&order.pair),
            order_type,
        };
        let request = self
            .core
            .request(Method::Post, "/v1/hadax/order/orders/place")?
            .with_json(&body)?;

        let placed: Envelope<OrderId> = self
            .core
            .send_json(Channel::Authenticated, request)
            .await
            .map_err(|e| e.into_mutation_error("submit_order"))?;
        let order_id = placed.into_result()?.0;

        log_order!("PLACED", order_id, order.pair);
        Ok(OrderResult::placed(order_id))
    }

    async fn cancel_order(&self, order_id: &str, pair: &TradingPair) -> Result<()> {
        let path = format!("/v1/order/orders/{order_id}/submitcancel");
        let request = self.core.request(Method::Post, &path)?;
        let cancelled: Envelope<OrderId> = self
            .core
            .send_json(Channel::Authenticated, request)
            .await
            .map_err(|e| e.into_mutation_error("cancel_order"))?;
        cancelled.into_result()?;

        log_order!("CANCELLED", order_id, pair);
        Ok(())
    }

    async fn cancel_all_orders(&self, pair: &TradingPair) -> Result<CancellationResult> {
        let ids = self.open_order_ids(pair).await?;
        Ok(cancel_each(ids, |id| async move { self.cancel_order(&id, pair).await }).await)
    }

    fn get_fee(&self, request: &FeeRequest) -> Fixed {
        self.core.fee(request)
    }

    fn withdraw_capabilities(&self) -> WithdrawPermissions {
        self.core.profile().withdraw_permissions
    }

    fn dispatch_stats(&self) -> DispatchStatsSnapshot {
        self.core.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::testing::ScriptedTransport;
    use multivenue_core::fixed;
    use std::time::Duration;

    const ACCOUNTS: &str = r#"{"status":"ok","data":[{"id":100009,"type":"spot","state":"working"}]}"#;

    fn driver(transport: &Rc<ScriptedTransport>) -> HuobiDriver {
        let config = VenueConfig::new(NAME).with_credentials(Credentials::new("key", "secret"));
        HuobiDriver::new(&config, transport.clone()).unwrap()
    }

    fn btc_usdt() -> TradingPair {
        TradingPair::new("BTC", "USDT").unwrap()
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_tradable_pairs() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(
            Method::Get,
            "/v1/hadax/common/symbols",
            r#"{"status":"ok","data":[
                {"base-currency":"btc","quote-currency":"usdt","symbol":"btcusdt"},
                {"base-currency":"eth","quote-currency":"btc","symbol":"ethbtc"}]}"#,
        );

        let pairs = driver(&transport).fetch_tradable_pairs(MarketType::Spot).await.unwrap();
        assert_eq!(pairs, vec![btc_usdt(), TradingPair::new("ETH", "BTC").unwrap()]);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_ticker_is_cached() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(
            Method::Get,
            "/market/detail/merged",
            r#"{"status":"ok","tick":{"close":6500.5,"high":6600,"low":6400,"vol":1200.25,"bid":[6500.1,0.5],"ask":[6500.9,1.2]}}"#,
        );
        let driver = driver(&transport);

        let ticker = driver.fetch_ticker(&btc_usdt(), MarketType::Spot).await.unwrap();
        assert_eq!(ticker.last.to_string(), "6500.5");
        assert_eq!(ticker.bid.to_string(), "6500.1");
        assert_eq!(ticker.ask.to_string(), "6500.9");

        driver.fetch_ticker(&btc_usdt(), MarketType::Spot).await.unwrap();
        assert_eq!(transport.count("/market/detail/merged"), 1);
        assert!(transport.requests()[0].url.query().unwrap().contains("symbol=btcusdt"));

        driver.update_ticker(&btc_usdt(), MarketType::Spot).await.unwrap();
        assert_eq!(transport.count("/market/detail/merged"), 2);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_margin_market_not_supported() {
        let transport = Rc::new(ScriptedTransport::new());
        let result = driver(&transport).fetch_ticker(&btc_usdt(), MarketType::Margin).await;
        assert!(matches!(result, Err(ExchangeError::NotSupported(_))));
        assert_eq!(transport.total(), 0);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_balance_rows_are_folded() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(Method::Get, "/v1/account/accounts", ACCOUNTS);
        transport.json(
            Method::Get,
            "/v1/hadax/account/accounts/100009/balance",
            r#"{"status":"ok","data":{"id":100009,"type":"spot","state":"working","list":[
                {"currency":"usdt","type":"trade","balance":"500.25"},
                {"currency":"usdt","type":"frozen","balance":"100"},
                {"currency":"btc","type":"frozen","balance":"0.5"}]}}"#,
        );

        let info = driver(&transport).get_account_info().await.unwrap();
        let usdt = info.balance("USDT").unwrap();
        assert_eq!(usdt.available.to_string(), "500.25");
        assert_eq!(usdt.held.to_string(), "100");
        assert_eq!(usdt.total().to_string(), "600.25");
        assert_eq!(info.balance("btc").unwrap().available, Fixed::ZERO);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_submit_order_returns_venue_id() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(Method::Get, "/v1/account/accounts", ACCOUNTS);
        transport.json(Method::Post, "/v1/hadax/order/orders/place", r#"{"status":"ok","data":"59378"}"#);
        let driver = driver(&transport);

        let order = OrderRequest::limit(btc_usdt(), OrderSide::Buy, fixed!(0.5), fixed!(6400));
        let result = driver.submit_order(&order).await.unwrap();
        assert_eq!(result, OrderResult::placed("59378"));

        let place = transport
            .requests()
            .into_iter()
            .find(|r| r.url.path() == "/v1/hadax/order/orders/place")
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(place.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["type"], "buy-limit");
        assert_eq!(body["account-id"], "100009");
        assert_eq!(body["price"], "6400");
        assert!(place.url.query().unwrap().contains("Signature="));
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_unsupported_order_type_never_dispatches() {
        let transport = Rc::new(ScriptedTransport::new());
        let mut order = OrderRequest::limit(btc_usdt(), OrderSide::Sell, fixed!(1), fixed!(6000));
        order.order_type = OrderType::StopLossLimit;

        let result = driver(&transport).submit_order(&order).await;
        assert!(matches!(result, Err(ExchangeError::UnsupportedOrderType { .. })));
        assert_eq!(transport.total(), 0);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_submit_timeout_is_unknown_outcome() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(Method::Get, "/v1/account/accounts", ACCOUNTS);
        transport.delayed(Method::Post, "/v1/hadax/order/orders/place", Duration::from_millis(500), r#"{"status":"ok","data":"1"}"#);
        let config = VenueConfig::new(NAME)
            .with_credentials(Credentials::new("key", "secret"))
            .with_timeout(Duration::from_millis(50));
        let driver = HuobiDriver::new(&config, transport.clone()).unwrap();

        let order = OrderRequest::market(btc_usdt(), OrderSide::Sell, fixed!(0.1));
        let result = driver.submit_order(&order).await;
        assert!(matches!(result, Err(ExchangeError::OutcomeUnknown { .. })));
        assert_eq!(driver.dispatch_stats().timeouts, 1);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_account_id_resolved_once_under_concurrency() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.delayed(Method::Get, "/v1/account/accounts", Duration::from_millis(30), ACCOUNTS);
        let driver = Rc::new(driver(&transport));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let driver = driver.clone();
                monoio::spawn(async move { driver.account_id().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.as_deref(), Ok("100009"));
        }
        assert_eq!(transport.count("/v1/account/accounts"), 1);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_cancel_all_reports_partial_failure() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.json(Method::Get, "/v1/account/accounts", ACCOUNTS);
        transport.json(
            Method::Get,
            "/v1/order/openOrders",
            r#"{"status":"ok","data":[{"id":1,"symbol":"btcusdt"},{"id":2,"symbol":"btcusdt"},{"id":3,"symbol":"btcusdt"}]}"#,
        );
        transport.json(Method::Post, "/v1/order/orders/1/submitcancel", r#"{"status":"ok","data":"1"}"#);
        transport.json(
            Method::Post,
            "/v1/order/orders/2/submitcancel",
            r#"{"status":"error","err-code":"order-orderstate-error","err-msg":"order already filled"}"#,
        );
        transport.json(Method::Post, "/v1/order/orders/3/submitcancel", r#"{"status":"ok","data":"3"}"#);

        let result = driver(&transport).cancel_all_orders(&btc_usdt()).await.unwrap();
        assert_eq!(result.attempted(), 3);
        assert_eq!(result.cancelled().collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(result.failures().map(|(id, _)| id).collect::<Vec<_>>(), vec!["2"]);
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_without_credentials_private_calls_fail_fast() {
        let transport = Rc::new(ScriptedTransport::new());
        let driver = HuobiDriver::new(&VenueConfig::huobi(), transport.clone()).unwrap();
        assert!(matches!(driver.get_account_info().await, Err(ExchangeError::MissingCredentials(_))));
        assert_eq!(transport.total(), 0);
    }

    #[test]
    fn test_fees_and_capabilities() {
        let transport = Rc::new(ScriptedTransport::new());
        let driver = driver(&transport);
        let trade = FeeRequest::trade(&btc_usdt(), fixed!(1), fixed!(100), false);
        assert_eq!(driver.get_fee(&trade), fixed!(0.2));
        assert_eq!(driver.get_fee(&FeeRequest { is_maker: true, ..trade }), fixed!(0.1));
        assert_eq!(
            driver.withdraw_capabilities().to_string(),
            "AUTO WITHDRAW CRYPTO WITH SETUP"
        );
    }

    #[monoio::test(timer_enabled = true)]
    async fn test_unsupported_operations() {
        let transport = Rc::new(ScriptedTransport::new());
        let driver = driver(&transport);
        let err = driver.deposit_address("BTC").await.unwrap_err();
        assert!(err.is_not_supported());
        assert!(driver.connect_websocket().await.unwrap_err().is_not_supported());
    }
}
