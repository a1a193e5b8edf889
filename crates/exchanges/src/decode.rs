//! Serde helpers for venue payloads
//!
//! Venues send numbers as JSON numbers, numeric strings, or `""`. Everything lands
//! in `Fixed` without a float round trip.

use multivenue_core::Fixed;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Deserialize a number or numeric string into `Fixed`; `""` and `null` are zero
pub fn fixed_any<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => Fixed::from_str_exact(&n.to_string()).map_err(de::Error::custom),
        serde_json::Value::String(s) => Fixed::parse_lenient(&s).map_err(de::Error::custom),
        serde_json::Value::Null => Ok(Fixed::ZERO),
        other => Err(de::Error::custom(format!("expected number, got {other}"))),
    }
}

/// Newtype for numbers inside arrays (`[[price, amount], ...]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Num(#[serde(deserialize_with = "fixed_any")] pub Fixed);

impl From<Num> for Fixed {
    fn from(n: Num) -> Fixed {
        n.0
    }
}

/// First two entries of a book row as (price, amount); extra columns are ignored
pub fn price_amount(row: &[Num]) -> Option<(Fixed, Fixed)> {
    match row {
        [price, amount, ..] => Some((price.0, amount.0)),
        _ => None,
    }
}

/// Deserialize an id that may arrive as a number or a string; `null` is empty
pub fn id_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected id, got {other}"))),
    }
}
