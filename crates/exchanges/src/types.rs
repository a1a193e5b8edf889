//! Common exchange types and data structures
//!
//! The normalized market-data and order model every venue driver maps into.
//! All prices, amounts and fees are `Fixed`.

use crate::errors::{ExchangeError, Result};
use multivenue_core::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// How a venue spells a trading pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFormat {
    pub delimiter: String,
    pub uppercase: bool,
}

impl PairFormat {
    pub fn new(delimiter: impl Into<String>, uppercase: bool) -> Self {
        Self {
            delimiter: delimiter.into(),
            uppercase,
        }
    }

    /// `BTC-USDT`
    pub fn dashed_upper() -> Self {
        Self::new("-", true)
    }
}

impl Default for PairFormat {
    fn default() -> Self {
        Self::dashed_upper()
    }
}

/// Ordered (base, quote) currency pair, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    /// Create a pair. Rejects empty codes and `base == quote`.
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Result<Self> {
        let base = base.as_ref().trim().to_uppercase();
        let quote = quote.as_ref().trim().to_uppercase();

        if base.is_empty() || quote.is_empty() {
            return Err(ExchangeError::InvalidPair(format!("empty currency in {base}/{quote}")));
        }
        if base == quote {
            return Err(ExchangeError::InvalidPair(format!("base equals quote: {base}")));
        }

        Ok(Self { base, quote })
    }

    /// Parse a pair written in any common spelling.
    ///
    /// Splits on the first of `-`, `_`, `/`. Without a delimiter the first three
    /// characters are the base (`BTCUSD`, `btcusdt`).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((base, quote)) = ['-', '_', '/'].iter().find_map(|d| s.split_once(*d)) {
            return Self::new(base, quote);
        }

        if s.len() <= 3 || !s.is_ascii() {
            return Err(ExchangeError::InvalidPair(s.to_string()));
        }
        let (base, quote) = s.split_at(3);
        Self::new(base, quote)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Render with a venue's format. Pure function of the pair and the format.
    pub fn format(&self, format: &PairFormat) -> String {
        let joined = format!("{}{}{}", self.base, format.delimiter, self.quote);
        if format.uppercase {
            joined
        } else {
            joined.to_lowercase()
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

/// Market a pair trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketType {
    Spot,
    Margin,
    Futures,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::Spot => write!(f, "spot"),
            MarketType::Margin => write!(f, "margin"),
            MarketType::Futures => write!(f, "futures"),
        }
    }
}

/// Latest ticker for one (venue, pair, market). Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub venue: String,
    pub pair: TradingPair,
    pub market_type: MarketType,
    pub last: Fixed,
    pub bid: Fixed,
    pub ask: Fixed,
    pub volume: Fixed,
    pub high: Fixed,
    pub low: Fixed,
    pub captured_at: Timestamp,
}

/// One price level of an order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Fixed,
    pub amount: Fixed,
}

impl BookLevel {
    pub fn new(price: Fixed, amount: Fixed) -> Self {
        Self { price, amount }
    }
}

/// Order book snapshot: bids by descending price, asks by ascending price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub venue: String,
    pub pair: TradingPair,
    pub market_type: MarketType,
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
    pub captured_at: Timestamp,
}

impl OrderBookSnapshot {
    /// Build a snapshot, ordering the levels whatever order the venue sent them in.
    /// The sort is stable so equal-priced levels keep their venue order.
    pub fn new(
        venue: impl Into<String>,
        pair: TradingPair,
        market_type: MarketType,
        mut bids: Vec<BookLevel>,
        mut asks: Vec<BookLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        Self {
            venue: venue.into(),
            pair,
            market_type,
            bids,
            asks,
            captured_at: Timestamp::now(),
        }
    }

    pub fn bids(&self) -> &[BookLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[BookLevel] {
        &self.asks
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Fixed> {
        self.bids.first().map(|level| level.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Fixed> {
        self.asks.first().map(|level| level.price)
    }

    /// Get bid-ask spread
    pub fn spread(&self) -> Option<Fixed> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Fixed> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Fixed::from_i64(2)),
            _ => None,
        }
    }

    /// Bids non-increasing and asks non-decreasing in price
    pub fn is_well_ordered(&self) -> bool {
        self.bids.windows(2).all(|w| w[0].price >= w[1].price)
            && self.asks.windows(2).all(|w| w[0].price <= w[1].price)
    }
}

/// Generic order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Generic order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
    StopLossLimit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::StopLoss => write!(f, "STOP_LOSS"),
            OrderType::StopLossLimit => write!(f, "STOP_LOSS_LIMIT"),
        }
    }
}

/// Generic order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub pair: TradingPair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: Fixed,
    /// Ignored for market orders
    pub price: Option<Fixed>,
    pub client_token: ClientToken,
}

impl OrderRequest {
    pub fn market(pair: TradingPair, side: OrderSide, amount: Fixed) -> Self {
        Self {
            pair,
            side,
            order_type: OrderType::Market,
            amount,
            price: None,
            client_token: ClientToken::new(),
        }
    }

    pub fn limit(pair: TradingPair, side: OrderSide, amount: Fixed, price: Fixed) -> Self {
        Self {
            pair,
            side,
            order_type: OrderType::Limit,
            amount,
            price: Some(price),
            client_token: ClientToken::new(),
        }
    }

    pub fn with_client_token(mut self, token: ClientToken) -> Self {
        self.client_token = token;
        self
    }

    /// Price that applies to this order: `None` for market orders
    pub fn effective_price(&self) -> Option<Fixed> {
        match self.order_type {
            OrderType::Market => None,
            _ => self.price,
        }
    }

    /// Reject requests no venue would accept
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(ExchangeError::InvalidOrder(format!("amount must be positive, got {}", self.amount)));
        }
        if matches!(self.order_type, OrderType::Limit | OrderType::StopLossLimit) {
            match self.price {
                Some(price) if price.is_positive() => {}
                _ => return Err(ExchangeError::InvalidOrder("limit order needs a positive price".into())),
            }
        }
        Ok(())
    }
}

/// Outcome of a confirmed placement. Unconfirmed placements are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub placed: bool,
    /// Venue-assigned, opaque
    pub order_id: String,
}

impl OrderResult {
    pub fn placed(order_id: impl Into<String>) -> Self {
        Self {
            placed: true,
            order_id: order_id.into(),
        }
    }
}

/// What to cancel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationRequest {
    Order { order_id: String, pair: TradingPair },
    AllForPair(TradingPair),
}

/// Per-order cancellation status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelStatus {
    Cancelled,
    Failed(String),
}

/// Result of a cancellation: one status per attempted order id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationResult {
    pub statuses: BTreeMap<String, CancelStatus>,
}

impl CancellationResult {
    pub fn record(&mut self, order_id: impl Into<String>, outcome: Result<()>) {
        let status = match outcome {
            Ok(()) => CancelStatus::Cancelled,
            Err(e) => CancelStatus::Failed(e.to_string()),
        };
        self.statuses.insert(order_id.into(), status);
    }

    pub fn attempted(&self) -> usize {
        self.statuses.len()
    }

    pub fn cancelled(&self) -> impl Iterator<Item = &str> {
        self.statuses
            .iter()
            .filter(|(_, s)| **s == CancelStatus::Cancelled)
            .map(|(id, _)| id.as_str())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statuses.iter().filter_map(|(id, s)| match s {
            CancelStatus::Failed(reason) => Some((id.as_str(), reason.as_str())),
            CancelStatus::Cancelled => None,
        })
    }

    pub fn all_cancelled(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Balance of one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub currency: String,
    pub available: Fixed,
    pub held: Fixed,
}

impl AccountBalance {
    /// Negative venue values are clamped to zero
    pub fn new(currency: impl Into<String>, available: Fixed, held: Fixed) -> Self {
        Self {
            currency: currency.into().to_uppercase(),
            available: available.non_negative(),
            held: held.non_negative(),
        }
    }

    /// Get total balance (available + held)
    pub fn total(&self) -> Fixed {
        self.available + self.held
    }
}

/// Balances held at one venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub venue: String,
    pub balances: Vec<AccountBalance>,
}

impl AccountInfo {
    pub fn balance(&self, currency: &str) -> Option<&AccountBalance> {
        self.balances.iter().find(|b| b.currency.eq_ignore_ascii_case(currency))
    }
}

/// Detail of a single order as reported by a venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_id: String,
    pub pair: TradingPair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: Fixed,
    pub price: Option<Fixed>,
    pub filled: Fixed,
}

/// Deposit or withdrawal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub currency: String,
    pub amount: Fixed,
    pub fee: Fixed,
    pub is_deposit: bool,
    pub timestamp: Timestamp,
}

/// Public trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub price: Fixed,
    pub amount: Fixed,
    pub side: OrderSide,
    pub timestamp: Timestamp,
}

/// Crypto withdrawal instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub currency: String,
    pub address: String,
    pub amount: Fixed,
}

/// Fee category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeCategory {
    TradeFee,
    WithdrawalFee,
    DepositFee,
    BankDepositFee,
    BankWithdrawalFee,
}

/// Normalized fee query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRequest {
    pub category: FeeCategory,
    pub first_currency: String,
    pub second_currency: String,
    pub amount: Fixed,
    pub price: Fixed,
    pub is_maker: bool,
}

impl FeeRequest {
    pub fn trade(pair: &TradingPair, amount: Fixed, price: Fixed, is_maker: bool) -> Self {
        Self {
            category: FeeCategory::TradeFee,
            first_currency: pair.base().to_string(),
            second_currency: pair.quote().to_string(),
            amount,
            price,
            is_maker,
        }
    }

    pub fn withdrawal(currency: impl Into<String>, amount: Fixed) -> Self {
        Self {
            category: FeeCategory::WithdrawalFee,
            first_currency: currency.into(),
            second_currency: String::new(),
            amount,
            price: Fixed::ZERO,
            is_maker: false,
        }
    }

    pub fn with_category(mut self, category: FeeCategory) -> Self {
        self.category = category;
        self
    }
}

/// Withdrawal methods a venue permits, as a bit set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WithdrawPermissions(u32);

impl WithdrawPermissions {
    pub const NONE: Self = Self(0);
    pub const AUTO_WITHDRAW_CRYPTO: Self = Self(1 << 0);
    pub const AUTO_WITHDRAW_CRYPTO_WITH_API_PERMISSION: Self = Self(1 << 1);
    pub const AUTO_WITHDRAW_CRYPTO_WITH_SETUP: Self = Self(1 << 2);
    pub const WITHDRAW_CRYPTO_WITH_2FA: Self = Self(1 << 3);
    pub const WITHDRAW_CRYPTO_WITH_SMS: Self = Self(1 << 4);
    pub const WITHDRAW_CRYPTO_WITH_EMAIL: Self = Self(1 << 5);
    pub const WITHDRAW_CRYPTO_WITH_WEBSITE_APPROVAL: Self = Self(1 << 6);
    pub const WITHDRAW_CRYPTO_WITH_API_PERMISSION: Self = Self(1 << 7);
    pub const AUTO_WITHDRAW_FIAT: Self = Self(1 << 8);
    pub const AUTO_WITHDRAW_FIAT_WITH_API_PERMISSION: Self = Self(1 << 9);
    pub const AUTO_WITHDRAW_FIAT_WITH_SETUP: Self = Self(1 << 10);
    pub const WITHDRAW_FIAT_WITH_2FA: Self = Self(1 << 11);
    pub const WITHDRAW_FIAT_WITH_SMS: Self = Self(1 << 12);
    pub const WITHDRAW_FIAT_WITH_EMAIL: Self = Self(1 << 13);
    pub const WITHDRAW_FIAT_WITH_WEBSITE_APPROVAL: Self = Self(1 << 14);
    pub const WITHDRAW_FIAT_WITH_API_PERMISSION: Self = Self(1 << 15);
    pub const WITHDRAW_CRYPTO_VIA_WEBSITE_ONLY: Self = Self(1 << 16);
    pub const WITHDRAW_FIAT_VIA_WEBSITE_ONLY: Self = Self(1 << 17);
    pub const NO_FIAT_WITHDRAWALS: Self = Self(1 << 18);

    const LABELS: [(Self, &'static str); 19] = [
        (Self::AUTO_WITHDRAW_CRYPTO, "AUTO WITHDRAW CRYPTO"),
        (Self::AUTO_WITHDRAW_CRYPTO_WITH_API_PERMISSION, "AUTO WITHDRAW CRYPTO WITH API PERMISSION"),
        (Self::AUTO_WITHDRAW_CRYPTO_WITH_SETUP, "AUTO WITHDRAW CRYPTO WITH SETUP"),
        (Self::WITHDRAW_CRYPTO_WITH_2FA, "WITHDRAW CRYPTO WITH 2FA"),
        (Self::WITHDRAW_CRYPTO_WITH_SMS, "WITHDRAW CRYPTO WITH SMS"),
        (Self::WITHDRAW_CRYPTO_WITH_EMAIL, "WITHDRAW CRYPTO WITH EMAIL"),
        (Self::WITHDRAW_CRYPTO_WITH_WEBSITE_APPROVAL, "WITHDRAW CRYPTO WITH WEBSITE APPROVAL"),
        (Self::WITHDRAW_CRYPTO_WITH_API_PERMISSION, "WITHDRAW CRYPTO WITH API PERMISSION"),
        (Self::AUTO_WITHDRAW_FIAT, "AUTO WITHDRAW FIAT"),
        (Self::AUTO_WITHDRAW_FIAT_WITH_API_PERMISSION, "AUTO WITHDRAW FIAT WITH API PERMISSION"),
        (Self::AUTO_WITHDRAW_FIAT_WITH_SETUP, "AUTO WITHDRAW FIAT WITH SETUP"),
        (Self::WITHDRAW_FIAT_WITH_2FA, "WITHDRAW FIAT WITH 2FA"),
        (Self::WITHDRAW_FIAT_WITH_SMS, "WITHDRAW FIAT WITH SMS"),
        (Self::WITHDRAW_FIAT_WITH_EMAIL, "WITHDRAW FIAT WITH EMAIL"),
        (Self::WITHDRAW_FIAT_WITH_WEBSITE_APPROVAL, "WITHDRAW FIAT WITH WEBSITE APPROVAL"),
        (Self::WITHDRAW_FIAT_WITH_API_PERMISSION, "WITHDRAW FIAT WITH API PERMISSION"),
        (Self::WITHDRAW_CRYPTO_VIA_WEBSITE_ONLY, "WITHDRAW CRYPTO VIA WEBSITE ONLY"),
        (Self::WITHDRAW_FIAT_VIA_WEBSITE_ONLY, "WITHDRAW FIAT VIA WEBSITE ONLY"),
        (Self::NO_FIAT_WITHDRAWALS, "NO FIAT WITHDRAWAL"),
    ];

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for WithdrawPermissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for WithdrawPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = Self::LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect();

        if labels.is_empty() {
            write!(f, "NO WITHDRAWAL PERMISSIONS")
        } else {
            write!(f, "{}", labels.join(" & "))
        }
    }
}
