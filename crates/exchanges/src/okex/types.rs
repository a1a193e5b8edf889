//! OKEx v3 spot payloads

use crate::decode::{fixed_any, id_any, Num};
use crate::errors::{ExchangeError, Result};
use multivenue_core::Fixed;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Instrument {
    pub base_currency: String,
    pub quote_currency: String,
}

#[derive(Debug, Deserialize)]
pub struct Ticker {
    #[serde(deserialize_with = "fixed_any")]
    pub last: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub best_bid: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub best_ask: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub high_24h: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub low_24h: Fixed,
    #[serde(default, deserialize_with = "fixed_any")]
    pub base_volume_24h: Fixed,
}

/// Rows are `[price, size, order_count]`
#[derive(Debug, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub bids: Vec<Vec<Num>>,
    #[serde(default)]
    pub asks: Vec<Vec<Num>>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    pub currency: String,
    #[serde(deserialize_with = "fixed_any")]
    pub available: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub hold: Fixed,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrder {
    pub client_oid: String,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub side: &'static str,
    pub instrument_id: String,
    pub margin_trading: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub size: String,
}

#[derive(Debug, Serialize)]
pub struct CancelOrder {
    pub instrument_id: String,
}

/// Placement and cancellation acknowledgement
#[derive(Debug, Deserialize)]
pub struct OrderAck {
    #[serde(default, deserialize_with = "id_any")]
    pub order_id: String,
    #[serde(default)]
    pub result: bool,
    #[serde(default, deserialize_with = "id_any")]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
}

impl OrderAck {
    pub fn into_result(self) -> Result<String> {
        if !self.result {
            return Err(ExchangeError::venue(self.error_code, self.error_message));
        }
        if self.order_id.is_empty() {
            return Err(ExchangeError::InvalidResponse("okex acknowledged without an order id".to_string()));
        }
        Ok(self.order_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct PendingOrder {
    #[serde(deserialize_with = "id_any")]
    pub order_id: String,
    pub instrument_id: String,
}

/// Body of a non-2xx reply: `{"code": 30008, "message": "..."}`
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(deserialize_with = "id_any", alias = "error_code")]
    pub code: String,
    #[serde(alias = "error_message")]
    pub message: String,
}

pub fn parse_error_body(body: &str) -> Option<ApiError> {
    serde_json::from_str(body).ok()
}
