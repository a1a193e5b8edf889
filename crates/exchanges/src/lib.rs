//! # MultiVenue Exchange Integrations
//!
//! Rate-limited, normalized REST adapters for several cryptocurrency venues behind
//! one trading interface.
//!
//! ## Architecture
//!
//! - **Rate limiter** - per venue, per channel (public / authenticated) GCRA budgets
//! - **Request dispatcher** - admission, signing and a bounded transport call; classifies, never retries
//! - **Venue drivers** - endpoint mapping and payload normalization, one per venue
//! - **Market data cache** - read-through snapshots with single-flight refresh
//! - **Fee engine** - per-venue fee tables, no I/O
//! - **Trading interface** - the facade callers use
//!
//! Everything runs on a thread-per-core monoio runtime with the timer enabled.

pub mod cache;
pub mod config;
pub mod decode;
pub mod dispatcher;
pub mod errors;
pub mod fees;
pub mod http;
pub mod manager;
pub mod rate_limit;
pub mod single_flight;
pub mod traits;
pub mod types;
pub mod venue;

#[cfg(feature = "huobi")]
pub mod huobi;
#[cfg(feature = "localbitcoins")]
pub mod localbitcoins;
#[cfg(feature = "okex")]
pub mod okex;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export main types
pub use config::{Credentials, ExchangesConfig, RateLimitSettings, RateLimitSpec, VenueConfig};
pub use dispatcher::{DispatchStatsSnapshot, RequestDispatcher};
pub use errors::{ErrorClass, ExchangeError, Result};
pub use http::{HttpRequest, HttpResponse, Method, MonoioHttpsClient};
pub use manager::TradingInterface;
pub use rate_limit::{Channel, RateLimiter};
pub use traits::{RequestSigner, Transport, VenueDriver};
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{Credentials, ExchangesConfig, VenueConfig};
    pub use crate::errors::{ErrorClass, ExchangeError, Result};
    pub use crate::manager::TradingInterface;
    pub use crate::traits::{Transport, VenueDriver};
    pub use crate::types::*;
    pub use multivenue_core::prelude::*;
}
