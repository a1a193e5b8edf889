//! Market data cache
//!
//! Latest ticker or order book per (venue, pair, market type). Read-through with a
//! staleness threshold; refreshes are single-flight per key. Entries are replaced
//! whole, never mutated, and live for the process lifetime.

use crate::errors::Result;
use crate::single_flight::SingleFlight;
use crate::types::{MarketType, TradingPair};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub venue: String,
    pub pair: TradingPair,
    pub market: MarketType,
}

impl CacheKey {
    pub fn new(venue: impl Into<String>, pair: TradingPair, market: MarketType) -> Self {
        Self {
            venue: venue.into(),
            pair,
            market,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.venue, self.pair, self.market)
    }
}

pub struct MarketDataCache<T> {
    entries: SingleFlight<CacheKey, T>,
    staleness: Duration,
}

impl<T: Clone> MarketDataCache<T> {
    pub fn new(staleness: Duration) -> Self {
        Self {
            entries: SingleFlight::new(),
            staleness,
        }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Cached snapshot if younger than the staleness threshold, otherwise exactly one
    /// refresh shared by every concurrent caller for the key
    pub async fn get<F, Fut>(&self, key: &CacheKey, refresh: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        trace!("cache read {}", key);
        self.entries.get_or_refresh(key, Some(self.staleness), false, refresh).await
    }

    /// Refresh regardless of age (still single-flight)
    pub async fn refresh<F, Fut>(&self, key: &CacheKey, refresh: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.entries.get_or_refresh(key, Some(self.staleness), true, refresh).await
    }

    /// Atomically replace the snapshot for `key`
    pub fn put(&self, key: CacheKey, snapshot: T) {
        self.entries.put(key, snapshot);
    }

    /// Current snapshot if present and fresh
    pub fn peek_fresh(&self, key: &CacheKey) -> Option<T> {
        self.entries
            .peek(key)
            .filter(|(_, age)| *age <= self.staleness)
            .map(|(snapshot, _)| snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
