//! HuobiHadax payloads

use crate::decode::{fixed_any, id_any, Num};
use crate::errors::{ExchangeError, Result};
use multivenue_core::Fixed;
use serde::{Deserialize, Serialize};

/// Every response is wrapped: `{"status":"ok","data":...}` or
/// `{"status":"error","err-code":...,"err-msg":...}`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(rename = "err-code", default)]
    pub err_code: Option<String>,
    #[serde(rename = "err-msg", default)]
    pub err_msg: Option<String>,
    pub data: Option<T>,
    pub tick: Option<T>,
}

impl<T> Envelope<T> {
    /// Payload of a successful response (`data`, or `tick` for market endpoints)
    pub fn into_result(self) -> Result<T> {
        if self.status != "ok" {
            return Err(ExchangeError::venue(
                self.err_code.unwrap_or_else(|| self.status.clone()),
                self.err_msg.unwrap_or_default(),
            ));
        }
        self.data
            .or(self.tick)
            .ok_or_else(|| ExchangeError::InvalidResponse("huobi response without data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct Symbol {
    #[serde(rename = "base-currency")]
    pub base_currency: String,
    #[serde(rename = "quote-currency")]
    pub quote_currency: String,
}

#[derive(Debug, Deserialize)]
pub struct MergedDetail {
    #[serde(deserialize_with = "fixed_any")]
    pub close: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub high: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub low: Fixed,
    #[serde(deserialize_with = "fixed_any")]
    pub vol: Fixed,
    #[serde(default)]
    pub bid: Vec<Num>,
    #[serde(default)]
    pub ask: Vec<Num>,
}

#[derive(Debug, Deserialize)]
pub struct Depth {
    #[serde(default)]
    pub bids: Vec<Vec<Num>>,
    #[serde(default)]
    pub asks: Vec<Vec<Num>>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    pub id: i64,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct BalanceSheet {
    pub list: Vec<BalanceRow>,
}

/// One row per (currency, kind); kind is `trade` (available) or `frozen` (held)
#[derive(Debug, Deserialize)]
pub struct BalanceRow {
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "fixed_any")]
    pub balance: Fixed,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrder {
    #[serde(rename = "account-id")]
    pub account_id: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub source: &'static str,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct OpenOrder {
    #[serde(deserialize_with = "id_any")]
    pub id: String,
    pub symbol: String,
}

/// Order id returned by placement and cancellation
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct OrderId(#[serde(deserialize_with = "id_any")] pub String);
