//! Unified trading interface
//!
//! One facade over every configured venue. Callers name the venue; the interface
//! routes to its driver and never retries. Disabled venues are kept by name so a
//! request to one is answered with `VenueDisabled` rather than `VenueNotFound`.

use crate::config::{ExchangesConfig, VenueConfig};
use crate::dispatcher::DispatchStatsSnapshot;
use crate::errors::{ExchangeError, Result};
use crate::http::MonoioHttpsClient;
use crate::traits::{Transport, VenueDriver};
use crate::types::*;
use multivenue_core::{log_error, Fixed};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{info, warn};

/// Builds a driver for one venue configuration
pub type DriverFactory = fn(&VenueConfig, Rc<dyn Transport>) -> Result<Box<dyn VenueDriver>>;

/// Factory for a driver compiled into this crate
pub fn builtin_factory(name: &str) -> Option<DriverFactory> {
    match name {
        #[cfg(feature = "huobi")]
        crate::huobi::NAME => Some(huobi_driver as DriverFactory),
        #[cfg(feature = "localbitcoins")]
        crate::localbitcoins::NAME => Some(localbitcoins_driver as DriverFactory),
        #[cfg(feature = "okex")]
        crate::okex::NAME => Some(okex_driver as DriverFactory),
        _ => None,
    }
}

#[cfg(feature = "huobi")]
fn huobi_driver(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Box<dyn VenueDriver>> {
    Ok(Box::new(crate::huobi::HuobiDriver::new(config, transport)?))
}

#[cfg(feature = "localbitcoins")]
fn localbitcoins_driver(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Box<dyn VenueDriver>> {
    Ok(Box::new(crate::localbitcoins::LocalBitcoinsDriver::new(config, transport)?))
}

#[cfg(feature = "okex")]
fn okex_driver(config: &VenueConfig, transport: Rc<dyn Transport>) -> Result<Box<dyn VenueDriver>> {
    Ok(Box::new(crate::okex::OkexDriver::new(config, transport)?))
}

struct VenueSlot {
    driver: Option<Box<dyn VenueDriver>>,
    /// Last successfully fetched pair list
    enabled_pairs: RefCell<Vec<TradingPair>>,
}

pub struct TradingInterface {
    venues: BTreeMap<String, VenueSlot>,
}

impl TradingInterface {
    /// Drivers for every configured venue over the monoio HTTPS transport
    pub fn new(config: &ExchangesConfig) -> Result<Self> {
        Self::with_transport(config, Rc::new(MonoioHttpsClient::new()))
    }

    /// Drivers for every configured venue sharing one transport
    pub fn with_transport(config: &ExchangesConfig, transport: Rc<dyn Transport>) -> Result<Self> {
        let mut interface = Self {
            venues: BTreeMap::new(),
        };

        for venue in &config.venues {
            let name = venue.name.to_lowercase();
            if !venue.enabled {
                info!("⏸️  {} disabled in configuration", name);
                interface.venues.insert(name, VenueSlot { driver: None, enabled_pairs: RefCell::default() });
                continue;
            }

            let factory = builtin_factory(&name).ok_or_else(|| ExchangeError::VenueNotFound(name.clone()))?;
            let driver = factory(venue, transport.clone())?;
            interface.register(driver);
        }

        info!("🌐 trading interface ready with {} venues", interface.venues.len());
        Ok(interface)
    }

    /// Add (or replace) a driver under its own name
    pub fn register(&mut self, driver: Box<dyn VenueDriver>) {
        let name = driver.name().to_lowercase();
        self.venues.insert(
            name,
            VenueSlot {
                driver: Some(driver),
                enabled_pairs: RefCell::default(),
            },
        );
    }

    pub fn venue_names(&self) -> Vec<&str> {
        self.venues.keys().map(String::as_str).collect()
    }

    pub fn enabled_venues(&self) -> Vec<&str> {
        self.venues
            .iter()
            .filter(|(_, slot)| slot.driver.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn slot(&self, venue: &str) -> Result<&VenueSlot> {
        self.venues
            .get(&venue.to_lowercase())
            .ok_or_else(|| ExchangeError::VenueNotFound(venue.to_string()))
    }

    pub fn driver(&self, venue: &str) -> Result<&dyn VenueDriver> {
        self.slot(venue)?
            .driver
            .as_deref()
            .ok_or_else(|| ExchangeError::VenueDisabled(venue.to_string()))
    }

    pub async fn fetch_tradable_pairs(&self, venue: &str, market: MarketType) -> Result<Vec<TradingPair>> {
        self.driver(venue)?.fetch_tradable_pairs(market).await
    }

    pub async fn fetch_ticker(&self, venue: &str, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        self.driver(venue)?.fetch_ticker(pair, market).await
    }

    pub async fn update_ticker(&self, venue: &str, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot> {
        self.driver(venue)?.update_ticker(pair, market).await
    }

    pub async fn fetch_order_book(&self, venue: &str, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        self.driver(venue)?.fetch_order_book(pair, market).await
    }

    pub async fn update_order_book(&self, venue: &str, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot> {
        self.driver(venue)?.update_order_book(pair, market).await
    }

    pub async fn get_account_info(&self, venue: &str) -> Result<AccountInfo> {
        self.driver(venue)?.get_account_info().await
    }

    pub async fn submit_order(&self, venue: &str, order: &OrderRequest) -> Result<OrderResult> {
        let result = self.driver(venue)?.submit_order(order).await;
        if let Err(e) = &result {
            log_error!(format!("{venue} submit_order"), e);
        }
        result
    }

    pub async fn cancel_order(&self, venue: &str, order_id: &str, pair: &TradingPair) -> Result<()> {
        self.driver(venue)?.cancel_order(order_id, pair).await
    }

    pub async fn cancel_all_orders(&self, venue: &str, pair: &TradingPair) -> Result<CancellationResult> {
        self.driver(venue)?.cancel_all_orders(pair).await
    }

    /// Either form of cancellation, reported per order id. A single-order request that
    /// fails returns the error itself so its class is preserved.
    pub async fn cancel(&self, venue: &str, request: &CancellationRequest) -> Result<CancellationResult> {
        match request {
            CancellationRequest::Order { order_id, pair } => {
                self.cancel_order(venue, order_id, pair).await?;
                let mut result = CancellationResult::default();
                result.record(order_id.clone(), Ok(()));
                Ok(result)
            }
            CancellationRequest::AllForPair(pair) => self.cancel_all_orders(venue, pair).await,
        }
    }

    pub fn get_fee(&self, venue: &str, request: &FeeRequest) -> Result<Fixed> {
        Ok(self.driver(venue)?.get_fee(request))
    }

    pub fn withdraw_capabilities(&self, venue: &str) -> Result<WithdrawPermissions> {
        Ok(self.driver(venue)?.withdraw_capabilities())
    }

    pub fn dispatch_stats(&self, venue: &str) -> Result<DispatchStatsSnapshot> {
        Ok(self.driver(venue)?.dispatch_stats())
    }

    /// Pairs from the last successful refresh of `venue`
    pub fn enabled_pairs(&self, venue: &str) -> Result<Vec<TradingPair>> {
        self.driver(venue)?;
        Ok(self.slot(venue)?.enabled_pairs.borrow().clone())
    }

    /// Ask every enabled venue for its pair list. Each outcome is reported; a failed
    /// venue keeps its previous list but the failure is not hidden.
    pub async fn refresh_tradable_pairs(&self, market: MarketType) -> BTreeMap<String, Result<Vec<TradingPair>>> {
        let mut outcomes = BTreeMap::new();

        for (name, slot) in &self.venues {
            let Some(driver) = slot.driver.as_deref() else {
                continue;
            };

            let outcome = driver.fetch_tradable_pairs(market).await;
            match &outcome {
                Ok(pairs) => {
                    info!("🔄 {} {} pairs: {}", name, market, pairs.len());
                    *slot.enabled_pairs.borrow_mut() = pairs.clone();
                }
                Err(e) if e.is_not_supported() => {}
                Err(e) => warn!("🔄 {} failed to update tradable pairs: {}", name, e),
            }
            outcomes.insert(name.clone(), outcome);
        }

        outcomes
    }
}
