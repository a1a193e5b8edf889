//! LocalBitcoins driver
//!
//! Pairs are BTC against a fiat currency. Orders are advertisements: creating one
//! returns no id, so placement is confirmed by finding the new ad in the caller's own
//! listing. The ticker endpoint answers for every currency at once and each refresh
//! fills the cache for all of them.

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
use crate::venue::{cancel_each, collect_pairs, reconcile_single, OrderTypeTable, VenueCore, VenueProfile};
use async_trait::async_trait;
use multivenue_core::{log_order, Fixed, Timestamp};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

pub use auth::LocalBitcoinsSigner;
use types::*;

pub const NAME: &str = "localbitcoins";
pub const BASE_URL: &str = "https://localbitcoins.com";

const BASE_CURRENCY: &str = "BTC";
const SPOT_ONLY: &[MarketType] = &[MarketType::Spot];

pub struct LocalBitcoinsDriver {
    core: VenueCore,
    order_types: OrderTypeTable<&'static str>,
    ad_template: AdTemplate,
}

impl LocalBitcoinsDriver {
    pub fn new(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Self> {
        let signer = match &config.credentials {
            Some(credentials) => Some(Box::new(LocalBitcoinsSigner::new(credentials.clone())?) as Box<dyn RequestSigner>),
            None => None,
        };

        Ok(Self {
            core: VenueCore::new(Self::profile(), config, transport, signer)?,
            order_types: OrderTypeTable::new(&[
                ((OrderSide::Buy, OrderType::Limit), "ONLINE_BUY"),
                ((OrderSide::Sell, OrderType::Limit), "ONLINE_SELL"),
            ]),
            ad_template: AdTemplate::default(),
        })
    }

    /// Account details (location, payment method, limits) stamped on every new ad
    pub fn with_ad_template(mut self, template: AdTemplate) -> Self {
        self.ad_template = template;
        self
    }

    pub fn profile() -> VenueProfile {
        VenueProfile {
            name: NAME,
            default_base_url: BASE_URL,
            markets: SPOT_ONLY,
            request_format: PairFormat::new("", true),
            config_format: PairFormat::new("", true),
            fees: FeeSchedule::new(NAME, Fixed::from_scaled(1, 2), Fixed::from_scaled(5, 3))
                .with_withdrawal_fee(BASE_CURRENCY, Fixed::from_scaled(5, 4)),
            withdraw_permissions: WithdrawPermissions::WITHDRAW_CRYPTO_VIA_WEBSITE_ONLY,
        }
    }

    fn ensure_btc(pair: &TradingPair) -> Result<()> {
        if pair.base() == BASE_CURRENCY {
            Ok(())
        } else {
            Err(ExchangeError::InvalidPair(format!("{NAME} only trades {BASE_CURRENCY} against fiat, got {pair}")))
        }
    }

    async fn get<T: DeserializeOwned>(&self, channel: Channel, path: &str) -> Result<T> {
        let response: ApiResponse<T> = self
            .core
            .get_json(channel, path, &[])
            .await
            .map_err(structured_error)?;
        response.into_result()
    }

    async fn post(&self, path: &str, form: &[(&str, String)]) -> Result<()> {
        let request = self.core.request(Method::Post, path)?.with_form(form);
        let response: ApiResponse<serde_json::Value> = self
            .core
            .send_json(Channel::Authenticated, request)
            .await
            .map_err(structured_error)?;
        response.into_result().map(drop)
    }

    async fn own_ads(&self) -> Result<Vec<Ad>> {
        let ads: AdList = self.get(Channel::Authenticated, "/api/ads/").await?;
        Ok(ads.ad_list.into_iter().map(|entry| entry.data).collect())
    }

    async fn load_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        let all: BTreeMap<String, CurrencyTicker> = self
            .core
            .get_json(Channel::Public, "/bitcoinaverage/ticker-all-currencies/", &[])
            .await?;

        let captured_at = Timestamp::now();
        let mut requested = None;
        let mut batched = 0usize;

        for (currency, tick) in all {
            let Ok(quoted) = TradingPair::new(BASE_CURRENCY, &currency) else {
                continue;
            };
            let snapshot = TickerSnapshot {
                venue: NAME.to_string(),
                pair: quoted.clone(),
                market_type: market,
                last: tick.avg_24h,
                bid: Fixed::ZERO,
                ask: Fixed::ZERO,
                volume: tick.volume_btc,
                high: Fixed::ZERO,
                low: Fixed::ZERO,
                captured_at,
            };

            if &quoted == pair {
                requested = Some(snapshot);
            } else {
                self.core.tickers().put(self.core.cache_key(&quoted, market), snapshot);
                batched += 1;
            }
        }

        debug!("{} ticker refresh cached {} sibling pairs", NAME, batched);
        requested.ok_or_else(|| ExchangeError::InvalidPair(format!("{NAME} returned no ticker for {pair}")))
    }

    async fn load_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        let path = format!("/bitcoincharts/{}/orderbook.json", pair.quote());
        let book: FiatBook = self.core.get_json(Channel::Public, &path, &[]).await?;

        Ok(OrderBookSnapshot::new(
            NAME,
            pair.clone(),
            market,
            base_levels(&book.bids),
            base_levels(&book.asks),
        ))
    }
}

/// Fiat-denominated rows to base-currency levels; rows without a positive price are dropped
fn base_levels(rows: &[Vec<Num>]) -> Vec<BookLevel> {
    rows.iter()
        .filter_map(|row| price_amount(row))
        .filter(|(price, _)| price.is_positive())
        .filter_map(|(price, fiat)| fiat.checked_div(price).ok().map(|amount| BookLevel::new(price, amount)))
        .collect()
}

/// Replace a raw non-2xx body with the venue's own error code and message when present
fn structured_error(error: ExchangeError) -> ExchangeError {
    match error {
        ExchangeError::Venue { code, message } => match parse_error_body(&message) {
            Some(api) => ExchangeError::venue(api.error_code, api.message),
            None => ExchangeError::Venue { code, message },
        },
        other => other,
    }
}

#[async_trait(?Send)]
impl VenueDriver for LocalBitcoinsDriver {
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
        let listing: Currencies = self.get(Channel::Public, "/api/currencies/").await?;
        Ok(collect_pairs(
            NAME,
            listing.currencies.keys().map(|currency| (BASE_CURRENCY, currency.as_str())),
        ))
    }

    async fn fetch_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        Self::ensure_btc(pair)?;
        self.core.ticker(pair, market, false, || self.load_ticker(pair, market)).await
    }

    async fn update_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        Self::ensure_btc(pair)?;
        self.core.ticker(pair, market, true, || self.load_ticker(pair, market)).await
    }

    async fn fetch_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        Self::ensure_btc(pair)?;
        self.core.order_book(pair, market, false, || self.load_order_book(pair, market)).await
    }

    async fn update_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        Self::ensure_btc(pair)?;
        self.core.order_book(pair, market, true, || self.load_order_book(pair, market)).await
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        let wallet: Wallet = self.get(Channel::Authenticated, "/api/wallet/").await?;
        let total = wallet.total;
        let held = (total.balance - total.sendable).non_negative();

        Ok(AccountInfo {
            venue: NAME.to_string(),
            balances: vec![AccountBalance::new(BASE_CURRENCY, total.sendable, held)],
        })
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult> {
        Self::ensure_btc(&order.pair)?;
        order.validate()?;
        let trade_type = self.order_types.lookup(order.side, order.order_type)?;
        let price = order
            .effective_price()
            .ok_or_else(|| ExchangeError::InvalidOrder("an ad needs a price".to_string()))?;
        let max_amount = order
            .amount
            .checked_mul(price)
            .map_err(|_| ExchangeError::InvalidOrder(format!("ad limit {} x {} is out of range", order.amount, price)))?;

        let ad = AdCreate {
            trade_type,
            price_equation: price.to_canonical_string(),
            currency: order.pair.quote().to_string(),
            max_amount: max_amount.round_dp(2),
            msg: order.client_token.as_str().to_string(),
            template: self.ad_template.clone(),
        };

        self.post("/api/ad-create/", &ad.form())
            .await
            .map_err(|e| e.into_mutation_error("submit_order"))?;

        // Creation returns no id; find the ad we just created.
        let ads = self.own_ads().await.map_err(|e| ExchangeError::OutcomeUnknown {
            operation: "submit_order".to_string(),
            reason: format!("ad created but the ad listing failed: {e}"),
        })?;
        let placed = reconcile_single(ads, |candidate| ad.matches(candidate))?;

        log_order!("PLACED", placed.ad_id, order.pair);
        Ok(OrderResult::placed(placed.ad_id))
    }

    async fn cancel_order(&self, order_id: &str, pair: &TradingPair) -> Result<()> {
        self.post(&format!("/api/ad-delete/{order_id}/"), &[])
            .await
            .map_err(|e| e.into_mutation_error("cancel_order"))?;
        log_order!("CANCELLED", order_id, pair);
        Ok(())
    }

    async fn cancel_all_orders(&self, pair: &TradingPair) -> Result<CancellationResult> {
        let ids: Vec<String> = self
            .own_ads()
            .await?
            .into_iter()
            .filter(|ad| ad.currency.eq_ignore_ascii_case(pair.quote()))
            .map(|ad| ad.ad_id)
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
