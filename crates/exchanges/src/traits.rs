//! Exchange traits defining common interfaces
//!
//! `Transport` and `RequestSigner` are the collaborators the dispatcher composes;
//! `VenueDriver` is the polymorphic contract every venue implements. Futures are
//! not `Send`: drivers run on a thread-per-core monoio runtime.

use crate::dispatcher::DispatchStatsSnapshot;
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::*;
use async_trait::async_trait;
use multivenue_core::Fixed;
use std::rc::Rc;

/// Performs one HTTP exchange. No retries, no rate limiting.
#[async_trait(?Send)]
pub trait Transport {
    async fn perform(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Rc<T> {
    async fn perform(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).perform(request).await
    }
}

/// Venue-specific request authentication
pub trait RequestSigner {
    /// Add whatever headers or query parameters the venue requires.
    /// Called immediately before the transport, after rate-limit admission.
    fn sign(&self, request: &mut HttpRequest) -> Result<()>;
}

/// Venue driver interface
///
/// Reads go through the driver's market data cache; mutations go straight to the
/// dispatcher. Nothing here retries: callers decide based on `ExchangeError::class`.
#[async_trait(?Send)]
pub trait VenueDriver {
    /// Get venue name
    fn name(&self) -> &str;

    fn supported_market_types(&self) -> &[MarketType];

    /// Pair spelling used in endpoint paths and parameters
    fn request_format(&self) -> &PairFormat;

    /// Pair spelling used in configuration
    fn config_format(&self) -> &PairFormat {
        self.request_format()
    }

    /// Every pair currently listed for the market. Never served from a stale list.
    async fn fetch_tradable_pairs(&self, market: MarketType) -> Result<Vec<TradingPair>>;

    /// Cached ticker, refreshed if missing or stale
    async fn fetch_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot>;

    /// Refresh the ticker regardless of cache age
    async fn update_ticker(&self, pair: &TradingPair, market: MarketType) -> Result<TickerSnapshot>;

    /// Cached order book, refreshed if missing or stale
    async fn fetch_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot>;

    /// Refresh the order book regardless of cache age
    async fn update_order_book(&self, pair: &TradingPair, market: MarketType) -> Result<OrderBookSnapshot>;

    async fn get_account_info(&self) -> Result<AccountInfo>;

    /// Place an order. A lost response surfaces as `OutcomeUnknown`; an unconfirmable
    /// placement as `PlacementAmbiguous`.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult>;

    async fn cancel_order(&self, order_id: &str, pair: &TradingPair) -> Result<()>;

    /// Best effort over the open orders listed at call time. One failure does not
    /// stop the others; it is recorded in the result.
    async fn cancel_all_orders(&self, pair: &TradingPair) -> Result<CancellationResult>;

    /// Table lookup, no I/O. Always finite and non-negative.
    fn get_fee(&self, request: &FeeRequest) -> Fixed;

    fn withdraw_capabilities(&self) -> WithdrawPermissions;

    fn dispatch_stats(&self) -> DispatchStatsSnapshot;

    async fn deposit_address(&self, _currency: &str) -> Result<String> {
        Err(ExchangeError::not_supported("deposit_address"))
    }

    async fn withdraw_crypto(&self, _request: &WithdrawRequest) -> Result<String> {
        Err(ExchangeError::not_supported("withdraw_crypto"))
    }

    async fn withdraw_fiat(&self, _currency: &str, _amount: Fixed) -> Result<String> {
        Err(ExchangeError::not_supported("withdraw_fiat"))
    }

    async fn withdraw_fiat_international(&self, _currency: &str, _amount: Fixed) -> Result<String> {
        Err(ExchangeError::not_supported("withdraw_fiat_international"))
    }

    async fn modify_order(&self, _order_id: &str, _amount: Option<Fixed>, _price: Option<Fixed>) -> Result<String> {
        Err(ExchangeError::not_supported("modify_order"))
    }

    async fn order_info(&self, _order_id: &str) -> Result<OrderDetail> {
        Err(ExchangeError::not_supported("order_info"))
    }

    async fn funding_history(&self) -> Result<Vec<FundingRecord>> {
        Err(ExchangeError::not_supported("funding_history"))
    }

    async fn exchange_history(&self, _pair: &TradingPair, _market: MarketType) -> Result<Vec<TradeRecord>> {
        Err(ExchangeError::not_supported("exchange_history"))
    }

    /// Streaming market data
    async fn connect_websocket(&self) -> Result<()> {
        Err(ExchangeError::not_supported("websocket"))
    }

    fn supports_websocket(&self) -> bool {
        false
    }
}
