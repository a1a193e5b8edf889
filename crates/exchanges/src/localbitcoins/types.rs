//! LocalBitcoins payloads

use crate::decode::{fixed_any, id_any, Num};
use crate::errors::{ExchangeError, Result};
use multivenue_core::Fixed;
use serde::Deserialize;
use std::collections::BTreeMap;

/// `{"data": ...}` on success, `{"error": {"message", "error_code"}}` on failure
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "id_any")]
    pub error_code: String,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(ExchangeError::venue(error.error_code, error.message));
        }
        self.data
            .ok_or_else(|| ExchangeError::InvalidResponse("localbitcoins response without data".to_string()))
    }
}

/// Error body of a non-2xx reply, if the venue sent its structured form
pub fn parse_error_body(body: &str) -> Option<ApiError> {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body).ok()?.error
}

#[derive(Debug, Deserialize)]
pub struct Currencies {
    pub currencies: BTreeMap<String, serde_json::Value>,
}

/// One entry of `ticker-all-currencies`, keyed by fiat code
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyTicker {
    #[serde(default, deserialize_with = "fixed_any")]
    pub avg_24h: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub volume_btc: Fixed,
}

/// Bitcoincharts book: amounts are in fiat
#[derive(Debug, Deserialize)]
pub struct FiatBook {
    #[serde(default)]
    pub bids: Vec<Vec<Num>>,
    #[serde(default)]
    pub asks: Vec<Vec<Num>>,
}

#[derive(Debug, Deserialize)]
pub struct Wallet {
    pub total: WalletTotal,
}

#[derive(Debug, Deserialize)]
pub struct WalletTotal {
    #[serde(deserialize_with = "fixed_any")]
    pub balance: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub sendable: Fixed,
}

#[derive(Debug, Deserialize)]
pub struct AdList {
    pub ad_list: Vec<AdEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AdEntry {
    pub data: Ad,
}

/// An advertisement as echoed back by the listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Ad {
    #[serde(deserialize_with = "id_any")]
    pub ad_id: String,
    pub trade_type: String,
    pub price_equation: String,
    pub currency: String,
    pub countrycode: String,
    pub city: String,
    pub location_string: String,
    pub online_provider: String,
    pub account_info: String,
    pub bank_name: String,
    pub msg: String,
    #[serde(deserialize_with = "fixed_any")]
    pub lat: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub lon: Fixed,
    pub sms_verification_required: bool,
    pub track_max_amount: bool,
    pub require_trusted_by_advertiser: bool,
    pub require_identification: bool,
    #[serde(deserialize_with = "fixed_any")]
    pub min_amount: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub max_amount: Fixed,
}

/// Account-level details every ad carries that an order request does not
#[derive(Debug, Clone, PartialEq)]
pub struct AdTemplate {
    pub country_code: String,
    pub city: String,
    pub location: String,
    pub latitude: Fixed,
    pub longitude: Fixed,
    pub online_provider: String,
    pub account_info: String,
    pub bank_name: String,
    pub min_amount: Fixed,
    pub sms_verification_required: bool,
    pub track_max_amount: bool,
    pub require_trusted_by_advertiser: bool,
    pub require_identification: bool,
}

impl Default for AdTemplate {
    fn default() -> Self {
        Self {
            country_code: "US".to_string(),
            city: "New York".to_string(),
            location: "New York".to_string(),
            latitude: Fixed::from_scaled(407128, 4),
            longitude: Fixed::from_scaled(-74006, 3),
            online_provider: "NATIONAL_BANK".to_string(),
            account_info: "-".to_string(),
            bank_name: "Bank".to_string(),
            min_amount: Fixed::from_i64(10),
            sms_verification_required: true,
            track_max_amount: true,
            require_trusted_by_advertiser: true,
            require_identification: true,
        }
    }
}

/// Fields of one ad to create: an order request rendered through the template
#[derive(Debug, Clone, PartialEq)]
pub struct AdCreate {
    pub trade_type: &'static str,
    pub price_equation: String,
    pub currency: String,
    pub max_amount: Fixed,
    pub msg: String,
    pub template: AdTemplate,
}

impl AdCreate {
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let flag = |b: bool| (if b { "1" } else { "0" }).to_string();
        let t = &self.template;
        vec![
            ("price_equation", self.price_equation.clone()),
            ("lat", t.latitude.to_canonical_string()),
            ("lon", t.longitude.to_canonical_string()),
            ("city", t.city.clone()),
            ("location_string", t.location.clone()),
            ("countrycode", t.country_code.clone()),
            ("currency", self.currency.clone()),
            ("account_info", t.account_info.clone()),
            ("bank_name", t.bank_name.clone()),
            ("msg", self.msg.clone()),
            ("sms_verification_required", flag(t.sms_verification_required)),
            ("track_max_amount", flag(t.track_max_amount)),
            ("require_trusted_by_advertiser", flag(t.require_trusted_by_advertiser)),
            ("require_identification", flag(t.require_identification)),
            ("online_provider", t.online_provider.clone()),
            ("trade_type", self.trade_type.to_string()),
            ("min_amount", t.min_amount.to_canonical_string()),
            ("max_amount", self.max_amount.to_canonical_string()),
        ]
    }

    /// Value-equality on every field the listing echoes back
    pub fn matches(&self, ad: &Ad) -> bool {
        let t = &self.template;
        ad.trade_type == self.trade_type
            && ad.price_equation == self.price_equation
            && ad.currency.eq_ignore_ascii_case(&self.currency)
            && ad.msg == self.msg
            && ad.max_amount == self.max_amount
            && ad.min_amount == t.min_amount
            && ad.countrycode == t.country_code
            && ad.city == t.city
            && ad.lat == t.latitude
            && ad.lon == t.longitude
            && ad.location_string == t.location
            && ad.online_provider == t.online_provider
            && ad.account_info == t.account_info
            && ad.bank_name == t.bank_name
            && ad.sms_verification_required == t.sms_verification_required
            && ad.track_max_amount == t.track_max_amount
            && ad.require_trusted_by_advertiser == t.require_trusted_by_advertiser
            && ad.require_identification == t.require_identification
    }
}
