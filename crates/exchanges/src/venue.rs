//! Shared venue-driver scaffolding
//!
//! `VenueCore` bundles what every driver composes: the dispatcher, the ticker and
//! order-book caches, the fee schedule and the static venue description. Drivers
//! supply only endpoint mapping and payload decoding.

use crate::cache::{CacheKey, MarketDataCache};
use crate::config::VenueConfig;
use crate::dispatcher::{DispatchStatsSnapshot, RequestDispatcher};
use crate::errors::{ExchangeError, Result};
use crate::fees::FeeSchedule;
use crate::http::{HttpRequest, Method};
use crate::rate_limit::{Channel, RateLimiter};
use crate::traits::{RequestSigner, Transport};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Static description of a venue
pub struct VenueProfile {
    pub name: &'static str,
    pub default_base_url: &'static str,
    pub markets: &'static [MarketType],
    pub request_format: PairFormat,
    pub config_format: PairFormat,
    pub fees: FeeSchedule,
    pub withdraw_permissions: WithdrawPermissions,
}

pub struct VenueCore {
    profile: VenueProfile,
    dispatcher: RequestDispatcher,
    tickers: MarketDataCache<TickerSnapshot>,
    books: MarketDataCache<OrderBookSnapshot>,
}

impl VenueCore {
    pub fn new(
        profile: VenueProfile,
        config: &VenueConfig,
        transport: Rc<dyn Transport>,
        signer: Option<Box<dyn RequestSigner>>,
    ) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url.as_deref().unwrap_or(profile.default_base_url);
        let limiter = RateLimiter::new(profile.name, &config.rate_limits);

        let mut dispatcher = RequestDispatcher::new(profile.name, base_url, transport, limiter, config.timeout())?
            .with_verbose(config.verbose);
        if let Some(signer) = signer {
            dispatcher = dispatcher.with_signer(signer);
        }

        info!(
            "🚀 {} driver ready: {} (authenticated: {}, staleness {}ms)",
            profile.name,
            base_url,
            dispatcher.has_signer(),
            config.staleness_ms
        );

        Ok(Self {
            tickers: MarketDataCache::new(config.staleness()),
            books: MarketDataCache::new(config.staleness()),
            profile,
            dispatcher,
        })
    }

    pub fn profile(&self) -> &VenueProfile {
        &self.profile
    }

    pub fn tickers(&self) -> &MarketDataCache<TickerSnapshot> {
        &self.tickers
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.dispatcher.stats()
    }

    pub fn fee(&self, request: &FeeRequest) -> multivenue_core::Fixed {
        self.profile.fees.fee(request)
    }

    pub fn ensure_market(&self, market: MarketType) -> Result<()> {
        if self.profile.markets.contains(&market) {
            Ok(())
        } else {
            Err(ExchangeError::NotSupported(format!("{} market on {}", market, self.profile.name)))
        }
    }

    pub fn symbol(&self, pair: &TradingPair) -> String {
        pair.format(&self.profile.request_format)
    }

    pub fn cache_key(&self, pair: &TradingPair, market: MarketType) -> CacheKey {
        CacheKey::new(self.profile.name, pair.clone(), market)
    }

    /// Ticker through the cache; `force` refreshes regardless of age
    pub async fn ticker<F, Fut>(&self, pair: &TradingPair, market: MarketType, force: bool, refresh: F) -> Result<TickerSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TickerSnapshot>>,
    {
        self.ensure_market(market)?;
        let key = self.cache_key(pair, market);
        if force {
            self.tickers.refresh(&key, refresh).await
        } else {
            self.tickers.get(&key, refresh).await
        }
    }

    /// Order book through the cache; `force` refreshes regardless of age
    pub async fn order_book<F, Fut>(&self, pair: &TradingPair, market: MarketType, force: bool, refresh: F) -> Result<OrderBookSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OrderBookSnapshot>>,
    {
        self.ensure_market(market)?;
        let key = self.cache_key(pair, market);
        if force {
            self.books.refresh(&key, refresh).await
        } else {
            self.books.get(&key, refresh).await
        }
    }

    pub fn request(&self, method: Method, path: &str) -> Result<HttpRequest> {
        self.dispatcher.request(method, path)
    }

    /// Dispatch and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, channel: Channel, request: HttpRequest) -> Result<T> {
        self.dispatcher.execute(channel, request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, channel: Channel, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.request(Method::Get, path)?.with_query(query);
        self.send_json(channel, request).await
    }
}

/// (side, type) to venue order-type code, with unlisted combinations unsupported
pub struct OrderTypeTable<C: Copy> {
    entries: HashMap<(OrderSide, OrderType), C>,
}

impl<C: Copy> OrderTypeTable<C> {
    pub fn new(entries: &[((OrderSide, OrderType), C)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    pub fn lookup(&self, side: OrderSide, order_type: OrderType) -> Result<C> {
        self.entries
            .get(&(side, order_type))
            .copied()
            .ok_or(ExchangeError::UnsupportedOrderType { side, order_type })
    }
}

/// Pick the single candidate satisfying `matches`. Zero or several is ambiguous:
/// never guess which entity is ours.
pub fn reconcile_single<T>(candidates: impl IntoIterator<Item = T>, matches: impl Fn(&T) -> bool) -> Result<T> {
    let mut found: Vec<T> = candidates.into_iter().filter(|c| matches(c)).collect();
    match found.len() {
        1 => Ok(found.remove(0)),
        n => {
            warn!("🔍 placement reconciliation found {} candidates", n);
            Err(ExchangeError::PlacementAmbiguous { matches: n })
        }
    }
}

/// Cancel every id independently; failures are recorded, not propagated
pub async fn cancel_each<F, Fut>(ids: Vec<String>, cancel: F) -> CancellationResult
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut result = CancellationResult::default();
    for id in ids {
        let outcome = cancel(id.clone()).await;
        if let Err(e) = &outcome {
            debug!("cancel {} failed: {}", id, e);
        }
        result.record(id, outcome);
    }
    result
}

/// Pairs from a listing, skipping rows that do not form a valid pair
pub fn collect_pairs<'a>(venue: &str, rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<TradingPair> {
    rows.into_iter()
        .filter_map(|(base, quote)| match TradingPair::new(base, quote) {
            Ok(pair) => Some(pair),
            Err(e) => {
                debug!("{} skipping listing {}/{}: {}", venue, base, quote, e);
                None
            }
        })
        .collect()
}
