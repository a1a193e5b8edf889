//! OKEx v3 spot driver

pub mod auth;
pub mod types;

use crate::config::VenueConfig;
use crate::decode::{price_amount, Num};
use crate::dispatcher::DispatchStatsSnapshot;
use crate::errors::{ExchangeError, Result};
use crate::fees::FeeSchedule;
use crate::http::Method;
use crate::rate_limit::Channel;
use crate::traits::{RequestSigner, Transport, VenueDriver};
use crate::types::*;
use crate::venue::{cancel_each, collect_pairs, OrderTypeTable, VenueCore, VenueProfile};
use async_trait::async_trait;
use multivenue_core::{log_order, Fixed, Timestamp};
use serde::de::DeserializeOwned;
use std::rc::Rc;

pub use auth::OkexSigner;
use types::*;

pub const NAME: &str = "okex";
pub const BASE_URL: &str = "https://www.okex.com";

const SPOT_ONLY: &[MarketType] = &[MarketType::Spot];
const BOOK_DEPTH: &str = "200";

pub struct OkexDriver {
    core: VenueCore,
    /// Market buys are sized in quote currency, which `OrderRequest` cannot express
    order_types: OrderTypeTable<(&'static str, &'static str)>,
}

impl OkexDriver {
    pub fn new(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Self> {
        let signer = match &config.credentials {
            Some(credentials) => Some(Box::new(OkexSigner::new(credentials.clone())?) as Box<dyn RequestSigner>),
            None => None,
        };

        Ok(Self {
            core: VenueCore::new(Self::profile(), config, transport, signer)?,
            order_types: OrderTypeTable::new(&[
                ((OrderSide::Buy, OrderType::Limit), ("buy", "limit")),
                ((OrderSide::Sell, OrderType::Limit), ("sell", "limit")),
                ((OrderSide::Sell, OrderType::Market), ("sell", "market")),
            ]),
        })
    }

    pub fn profile() -> VenueProfile {
        VenueProfile {
            name: NAME,
            default_base_url: BASE_URL,
            markets: SPOT_ONLY,
            request_format: PairFormat::dashed_upper(),
            config_format: PairFormat::dashed_upper(),
            fees: FeeSchedule::new(NAME, Fixed::from_scaled(15, 4), Fixed::from_scaled(1, 3)).with_withdrawal_fees(&[
                ("BTC", Fixed::from_scaled(5, 4)),
                ("LTC", Fixed::from_scaled(1, 3)),
                ("ETH", Fixed::from_scaled(1, 2)),
                ("ETC", Fixed::from_scaled(1, 2)),
                ("BCH", Fixed::from_scaled(1, 4)),
                ("USDT", Fixed::from_i64(2)),
            ]),
            withdraw_permissions: WithdrawPermissions::AUTO_WITHDRAW_CRYPTO,
        }
    }

    fn instrument(&self, pair: &TradingPair) -> String {
        self.core.symbol(pair)
    }

    async fn get<T: DeserializeOwned>(&self, channel: Channel, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.core.get_json(channel, path, query).await.map_err(structured_error)
    }

    async fn post_ack<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<OrderAck> {
        let request = self.core.request(Method::Post, path)?.with_json(body)?;
        self.core
            .send_json(Channel::Authenticated, request)
            .await
            .map_err(structured_error)
    }

    async fn load_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        let path = format!("/api/spot/v3/instruments/{}/ticker", self.instrument(pair));
        let ticker: Ticker = self.get(Channel::Public, &path, &[]).await?;

        Ok(TickerSnapshot {
            venue: NAME.to_string(),
            pair: pair.clone(),
            market_type: market,
            last: ticker.last,
            bid: ticker.best_bid,
            ask: ticker.best_ask,
            volume: ticker.base_volume_24h,
            high: ticker.high_24h,
            low: ticker.low_24h,
            captured_at: Timestamp::now(),
        })
    }

    async fn load_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        let path = format!("/api/spot/v3/instruments/{}/book", self.instrument(pair));
        let book: Book = self
            .get(Channel::Public, &path, &[("size", BOOK_DEPTH.to_string())])
            .await?;

        let levels = |rows: &[Vec<Num>]| -> Vec<BookLevel> {
            rows.iter()
                .filter_map(|row| price_amount(row))
                .map(|(price, amount)| BookLevel::new(price, amount))
                .collect()
        };
        Ok(OrderBookSnapshot::new(NAME, pair.clone(), market, levels(&book.bids), levels(&book.asks)))
    }
}

fn structured_error(error: ExchangeError) -> ExchangeError {
    match error {
        ExchangeError::Venue { code, message } => match parse_error_body(&message) {
            Some(api) => ExchangeError::venue(api.code, api.message),
            None => ExchangeError::Venue { code, message },
        },
        other => other,
    }
}

#[async_trait(?Send)]
impl VenueDriver for OkexDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn supported_market_types(&self) -> &[MarketType] {
        SPOT_ONLY
    }

    fn request_format(&self) -> &PairFormat {
        &self.core.profile().request_format
    }

    async fn fetch_tradable_pairs(&self, market: MarketType) -> Result<Vec<TradingPair>> {
        self.core.ensure_market(market)?;
        let instruments: Vec<Instrument> = self.get(Channel::Public, "/api/spot/v3/instruments", &[]).await?;
        Ok(collect_pairs(
            NAME,
            instruments.iter().map(|i| (i.base_currency.as_str(), i.quote_currency.as_str())),
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
        let accounts: Vec<Account> = self.get(Channel::Authenticated, "/api/spot/v3/accounts", &[]).await?;
        Ok(AccountInfo {
            venue: NAME.to_string(),
            balances: accounts
                .into_iter()
                .map(|a| AccountBalance::new(a.currency, a.available, a.hold))
                .collect(),
        })
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        order.validate()?;
        let (side, order_type) = self.order_types.lookup(order.side, order.order_type)?;

        let body = PlaceOrder {
            client_oid: order.client_token.as_str().to_string(),
            order_type,
            side,
            instrument_id: self.instrument(&order.pair),
            margin_trading: "1",
            price: order.effective_price().map(|p| p.to_canonical_string()),
            size: order.amount.to_canonical_string(),
        };
        let ack = self
            .post_ack("/api/spot/v3/orders", &body)
            .await
            .map_err(|e| e.into_mutation_error("submit_order"))?;
        let order_id = ack.into_result()?;

        log_order!("PLACED", order_id, order.pair);
        Ok(OrderResult::placed(order_id))
    }

    async fn cancel_order(&self, order_id: &str, pair: &TradingPair) -> Result<()> {
        let body = CancelOrder {
            instrument_id: self.instrument(pair),
        };
        self.post_ack(&format!("/api/spot/v3/cancel_orders/{order_id}"), &body)
            .await
            .map_err(|e| e.into_mutation_error("cancel_order"))?
            .into_result()?;

        log_order!("CANCELLED", order_id, pair);
        Ok(())
    }

    async fn cancel_all_orders(&self, pair: &TradingPair) -> Result<CancellationResult> {
        let instrument = self.instrument(pair);
        let pending: Vec<PendingOrder> = self
            .get(
                Channel::Authenticated,
                "/api/spot/v3/orders_pending",
                &[("instrument_id", instrument.clone())],
            )
            .await?;
        let ids = pending
            .into_iter()
            .filter(|o| o.instrument_id == instrument)
            .map(|o| o.order_id)
            .collect();

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
