//! Fixed-point arithmetic implementation
//!
//! Wraps `rust_decimal::Decimal` so prices, amounts and fees are exact.
//! Unlike a range-capped price type, `Fixed` spans the full decimal range:
//! a notional (amount * price) of a large trade must stay representable.

use rust_decimal::{Decimal, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::iter::Sum;
use std::ops::{Add, Sub, Mul, Div, AddAssign, SubAssign, Neg};
use std::str::FromStr;

/// Fixed-point decimal type for precise financial calculations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed {
    value: Decimal,
}

impl Fixed {
    /// Zero value
    pub const ZERO: Fixed = Fixed {
        value: Decimal::ZERO,
    };

    /// One value
    pub const ONE: Fixed = Fixed {
        value: Decimal::ONE,
    };

    /// Largest representable value
    pub const MAX: Fixed = Fixed {
        value: Decimal::MAX,
    };

    /// Create a Fixed from an integer
    pub fn from_i64(value: i64) -> Self {
        Fixed {
            value: Decimal::from(value),
        }
    }

    /// `mantissa * 10^-scale`, e.g. `from_scaled(15, 4)` is 0.0015
    pub fn from_scaled(mantissa: i64, scale: u32) -> Self {
        Fixed {
            value: Decimal::new(mantissa, scale.min(28)),
        }
    }

    /// Create a Fixed from a float (use with caution)
    ///
    /// NaN and infinities are rejected, so every `Fixed` is finite.
    pub fn from_f64(value: f64) -> Result<Self, FixedError> {
        if !value.is_finite() {
            return Err(FixedError::InvalidValue);
        }
        let decimal = Decimal::from_f64(value).ok_or(FixedError::InvalidValue)?;
        Ok(Fixed { value: decimal.normalize() })
    }

    /// Create a Fixed from a string
    pub fn from_str_exact(s: &str) -> Result<Self, FixedError> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| FixedError::InvalidValue)?;
        Ok(Fixed { value: decimal })
    }

    /// Parse a venue-supplied numeric string, treating an empty string as zero.
    ///
    /// Several venues send `""` for fields that have no value yet (e.g. price of a market order).
    pub fn parse_lenient(s: &str) -> Result<Self, FixedError> {
        if s.trim().is_empty() {
            return Ok(Self::ZERO);
        }
        Self::from_str_exact(s)
    }

    /// Get the underlying Decimal value
    pub fn to_decimal(&self) -> Decimal {
        self.value
    }

    /// Convert to f64 (may lose precision)
    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or(0.0)
    }

    /// Canonical string without trailing zeros (`"1.50"` -> `"1.5"`)
    pub fn to_canonical_string(&self) -> String {
        self.value.normalize().to_string()
    }

    /// Check if the value is zero
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// Strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.value < Decimal::ZERO
    }

    /// Get the absolute value
    pub fn abs(&self) -> Self {
        Fixed {
            value: self.value.abs(),
        }
    }

    /// Clamp negative values to zero
    pub fn non_negative(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }

    /// Round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Fixed {
            value: self.value.round_dp(dp),
        }
    }

    /// Round half-away-from-zero to the nearest integer
    pub fn round(&self) -> Self {
        Fixed {
            value: self.value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        }
    }

    /// Multiplication that reports overflow instead of panicking
    pub fn checked_mul(self, rhs: Fixed) -> Result<Fixed, FixedError> {
        self.value
            .checked_mul(rhs.value)
            .map(|value| Fixed { value })
            .ok_or(FixedError::Overflow)
    }

    /// Multiplication clamped to the representable range
    pub fn saturating_mul(self, rhs: Fixed) -> Fixed {
        Fixed {
            value: self.value.saturating_mul(rhs.value),
        }
    }

    /// Division that reports a zero divisor instead of panicking
    pub fn checked_div(self, rhs: Fixed) -> Result<Fixed, FixedError> {
        if rhs.is_zero() {
            return Err(FixedError::DivisionByZero);
        }
        self.value
            .checked_div(rhs.value)
            .map(|value| Fixed { value })
            .ok_or(FixedError::Overflow)
    }
}

/// Fixed-point arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    #[error("Invalid value")]
    InvalidValue,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Overflow in arithmetic operation")]
    Overflow,
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value + rhs.value,
        }
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value - rhs.value,
        }
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value * rhs.value,
        }
    }
}

impl Div for Fixed {
    type Output = Fixed;

    fn div(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value / rhs.value,
        }
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Self::Output {
        Fixed { value: -self.value }
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.value -= rhs.value;
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Fixed>>(iter: I) -> Self {
        iter.fold(Fixed::ZERO, |acc, x| acc + x)
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Fixed {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_exact(s)
    }
}

impl From<Decimal> for Fixed {
    fn from(value: Decimal) -> Self {
        Fixed { value }
    }
}

impl From<Fixed> for Decimal {
    fn from(fixed: Fixed) -> Self {
        fixed.value
    }
}

impl From<i64> for Fixed {
    fn from(value: i64) -> Self {
        Fixed::from_i64(value)
    }
}

/// Convenience macro for creating Fixed values from literals
#[macro_export]
macro_rules! fixed {
    ($value:expr) => {
        $crate::fixed::Fixed::from_str_exact(stringify!($value)).unwrap()
    };
}
