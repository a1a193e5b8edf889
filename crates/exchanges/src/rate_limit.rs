//! Per-venue, per-channel rate limiting
//!
//! Each channel gets its own GCRA bucket (`governor`): `max_calls` per `window`,
//! replenished continuously at one call per `window / max_calls`. Callers over
//! budget are delayed, never rejected. The only failure is shutdown.

use crate::config::{RateLimitSettings, RateLimitSpec};
use crate::errors::{ExchangeError, Result};
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

type Limiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Rate-limit scope of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Public,
    Authenticated,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Public => write!(f, "public"),
            Channel::Authenticated => write!(f, "authenticated"),
        }
    }
}

struct ChannelGate {
    spec: RateLimitSpec,
    /// `None` when the channel is unthrottled
    limiter: Option<Limiter>,
}

impl ChannelGate {
    fn new(spec: RateLimitSpec) -> Self {
        Self {
            spec,
            limiter: Self::create_limiter(&spec),
        }
    }

    fn create_limiter(spec: &RateLimitSpec) -> Option<Limiter> {
        if spec.is_unthrottled() {
            return None;
        }
        let burst = NonZeroU32::new(spec.max_calls)?;
        // A budget finer than the clock still throttles at one call per nanosecond.
        let period = (spec.window() / spec.max_calls).max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)?.allow_burst(burst);
        Some(GovernorRateLimiter::direct(quota))
    }
}

/// Rate limiter owned by one venue driver
pub struct RateLimiter {
    venue: String,
    public: ChannelGate,
    authenticated: ChannelGate,
    shut_down: AtomicBool,
    // Dropping the sender wakes every pending `acquire`.
    shutdown_tx: Mutex<Option<flume::Sender<()>>>,
    shutdown_rx: flume::Receiver<()>,
}

impl RateLimiter {
    pub fn new(venue: impl Into<String>, settings: &RateLimitSettings) -> Self {
        let venue = venue.into();
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);

        debug!(
            "⏱️ {} rate limits: authenticated {}/{}ms, public {}/{}ms",
            venue,
            settings.authenticated.max_calls,
            settings.authenticated.window_ms,
            settings.unauthenticated.max_calls,
            settings.unauthenticated.window_ms
        );

        Self {
            venue,
            public: ChannelGate::new(settings.unauthenticated),
            authenticated: ChannelGate::new(settings.authenticated),
            shut_down: AtomicBool::new(false),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
        }
    }

    pub fn unthrottled(venue: impl Into<String>) -> Self {
        Self::new(venue, &RateLimitSettings::unthrottled())
    }

    fn gate(&self, channel: Channel) -> &ChannelGate {
        match channel {
            Channel::Public => &self.public,
            Channel::Authenticated => &self.authenticated,
        }
    }

    /// Wait until the channel's budget admits one call.
    pub async fn acquire(&self, channel: Channel) -> Result<()> {
        if self.is_shut_down() {
            return Err(ExchangeError::Shutdown);
        }

        let Some(limiter) = &self.gate(channel).limiter else {
            return Ok(());
        };

        if limiter.check().is_ok() {
            return Ok(());
        }

        debug!("⏳ {} {} channel over budget, waiting", self.venue, channel);
        monoio::select! {
            _ = limiter.until_ready() => {}
            _ = self.shutdown_rx.recv_async() => {}
        }

        // A slot admitted concurrently with shutdown is not used.
        if self.is_shut_down() {
            return Err(ExchangeError::Shutdown);
        }
        Ok(())
    }

    /// Admit one call only if the budget allows it right now
    pub fn try_acquire(&self, channel: Channel) -> Result<bool> {
        if self.is_shut_down() {
            return Err(ExchangeError::Shutdown);
        }
        Ok(match &self.gate(channel).limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        })
    }

    /// Fail every pending and future `acquire` with `Shutdown`
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            info!("🛑 {} rate limiter shut down", self.venue);
        }
        let mut tx = self.shutdown_tx.lock().unwrap_or_else(|e| e.into_inner());
        tx.take();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn spec(&self, channel: Channel) -> RateLimitSpec {
        self.gate(channel).spec
    }

    pub fn is_throttled(&self, channel: Channel) -> bool {
        self.gate(channel).limiter.is_some()
    }
}
