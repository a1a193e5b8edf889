//! Exchange error taxonomy
//!
//! Every failure a venue operation can report. The dispatcher produces the
//! transport-level variants (`Transport`, `Venue`, `Timeout`); drivers may enrich
//! them (a timed-out order placement becomes `OutcomeUnknown`) but never swallow them.
//! Rate limiting is absorbed as a delay and has no variant.

use crate::types::{OrderSide, OrderType};
use thiserror::Error;

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Exchange operation errors
///
/// `Clone` so a single refresh result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Venue error {code}: {message}")]
    Venue { code: String, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Outcome unknown for {operation}, verify before retrying: {reason}")]
    OutcomeUnknown { operation: String, reason: String },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Placement could not be confirmed: {matches} matching open entities")]
    PlacementAmbiguous { matches: usize },

    #[error("Unsupported order type combination: {side} {order_type}")]
    UnsupportedOrderType { side: OrderSide, order_type: OrderType },

    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Venue not found: {0}")]
    VenueNotFound(String),

    #[error("Venue disabled: {0}")]
    VenueDisabled(String),

    #[error("Shut down")]
    Shutdown,

    #[error("Fixed point error: {0}")]
    FixedPoint(String),
}

/// How a caller should treat an error when deciding whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient; the same request may succeed later
    Retryable,
    /// The request itself is wrong or was rejected; retrying unchanged will not help
    Permanent,
    /// The venue may or may not have applied a mutation; verify before retrying
    Ambiguous,
    /// The venue has no equivalent operation; disable the feature instead of retrying
    Unsupported,
}

impl ExchangeError {
    pub fn venue(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Venue {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported(operation.into())
    }

    /// Classify for retry decisions.
    ///
    /// A `Timeout` is classed as retryable: for reads it is a confirmed failure, and
    /// mutating operations convert it into `OutcomeUnknown` before it reaches the caller.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transport(_) | Self::Timeout(_) => ErrorClass::Retryable,
            Self::OutcomeUnknown { .. } | Self::PlacementAmbiguous { .. } => ErrorClass::Ambiguous,
            Self::NotSupported(_) | Self::UnsupportedOrderType { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    pub fn is_not_supported(&self) -> bool {
        self.class() == ErrorClass::Unsupported
    }

    /// Convert a timeout of a mutating call into an explicit unknown outcome.
    /// Any other error passes through unchanged.
    pub fn into_mutation_error(self, operation: &str) -> Self {
        match self {
            Self::Timeout(reason) => Self::OutcomeUnknown {
                operation: operation.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl From<multivenue_core::fixed::FixedError> for ExchangeError {
    fn from(err: multivenue_core::fixed::FixedError) -> Self {
        Self::FixedPoint(err.to_string())
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
