//! # MultiVenue Core
//!
//! Shared runtime and value types for the MultiVenue exchange layer.
//!
//! ## Building blocks
//!
//! 1. **Timer-enabled monoio runtime** - rate limiting and dispatch timeouts need the timer
//! 2. **Precision timestamps** - capture times for market snapshots, dispatch latency
//! 3. **Fixed-point arithmetic** - exact decimal prices, amounts and fees
//! 4. **Unified logging** - tracing subscriber (optionally ftlog)
//! 5. **Correlation tokens** - nanoid-based client order tokens

pub mod runtime;
pub mod timing;
pub mod fixed;
pub mod logging;
pub mod id_gen;

// Re-export commonly used items
pub use runtime::VenueRuntime;
pub use timing::{nanos, PerfTimer, Timestamp};
pub use fixed::{Fixed, FixedError};
pub use logging::init_logging;
pub use id_gen::{next_nonce, ClientToken, RequestId};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::runtime::{VenueRuntime, RuntimeConfig};
    pub use crate::timing::{nanos, PerfTimer, Timestamp};
    pub use crate::fixed::{Fixed, FixedError};
    pub use crate::id_gen::{generate_id_with_prefix, next_nonce, ClientToken, RequestId};
    pub use crate::logging::init_logging;

    // Common external types
    pub use monoio;
    pub use serde::{Deserialize, Serialize};
    pub use chrono::{DateTime, Utc};
}
