//! Venue configuration
//!
//! Per-venue enabled flag, credentials, rate-limit budgets per channel, cache staleness
//! and dispatch timeout. Deserializable from JSON; reading the file is the caller's job.

use crate::errors::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STALENESS_MS: u64 = 10_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// API credentials for the authenticated channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    /// OKEx passphrase
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Calls permitted per rolling window. A zero window or zero budget disables throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSpec {
    pub window_ms: u64,
    pub max_calls: u32,
}

impl RateLimitSpec {
    pub fn new(window: Duration, max_calls: u32) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            max_calls,
        }
    }

    pub fn unthrottled() -> Self {
        Self { window_ms: 0, max_calls: 0 }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn is_unthrottled(&self) -> bool {
        self.window_ms == 0 || self.max_calls == 0
    }
}

/// Budgets for both channels of one venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub authenticated: RateLimitSpec,
    pub unauthenticated: RateLimitSpec,
}

impl RateLimitSettings {
    pub fn unthrottled() -> Self {
        Self {
            authenticated: RateLimitSpec::unthrottled(),
            unauthenticated: RateLimitSpec::unthrottled(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self::unthrottled()
    }
}

fn default_true() -> bool {
    true
}

fn default_staleness_ms() -> u64 {
    DEFAULT_STALENESS_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Configuration of one venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Driver name: `huobi`, `localbitcoins` or `okex`
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides the venue's production endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub rate_limits: RateLimitSettings,
    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub verbose: bool,
}

impl VenueConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            base_url: None,
            credentials: None,
            rate_limits: RateLimitSettings::default(),
            staleness_ms: DEFAULT_STALENESS_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verbose: false,
        }
    }

    /// HuobiHadax: 100 calls per 10 s on each channel
    pub fn huobi() -> Self {
        Self::new("huobi").with_rate_limits(RateLimitSettings {
            authenticated: RateLimitSpec::new(Duration::from_secs(10), 100),
            unauthenticated: RateLimitSpec::new(Duration::from_secs(10), 100),
        })
    }

    /// LocalBitcoins publishes no limit
    pub fn localbitcoins() -> Self {
        Self::new("localbitcoins")
    }

    /// OKEx: 600 calls per 2 s on each channel
    pub fn okex() -> Self {
        Self::new("okex").with_rate_limits(RateLimitSettings {
            authenticated: RateLimitSpec::new(Duration::from_secs(2), 600),
            unauthenticated: RateLimitSpec::new(Duration::from_secs(2), 600),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Read `<NAME>_API_KEY`, `<NAME>_API_SECRET` and optionally `<NAME>_API_PASSPHRASE`
    pub fn with_env_credentials(mut self) -> Result<Self> {
        let prefix = self.name.to_uppercase();
        let key_var = format!("{prefix}_API_KEY");
        let secret_var = format!("{prefix}_API_SECRET");

        let api_key = std::env::var(&key_var).map_err(|_| ExchangeError::MissingCredentials(key_var))?;
        let api_secret = std::env::var(&secret_var).map_err(|_| ExchangeError::MissingCredentials(secret_var))?;

        let mut credentials = Credentials::new(api_key, api_secret);
        credentials.passphrase = std::env::var(format!("{prefix}_API_PASSPHRASE")).ok();
        self.credentials = Some(credentials);
        Ok(self)
    }

    pub fn with_rate_limits(mut self, rate_limits: RateLimitSettings) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness_ms = staleness.as_millis() as u64;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ExchangeError::Configuration("venue name is empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ExchangeError::Configuration(format!("{}: timeout_ms must be positive", self.name)));
        }
        Ok(())
    }
}

/// Configuration of every venue the trading interface manages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangesConfig {
    pub venues: Vec<VenueConfig>,
}

impl ExchangesConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        for venue in &config.venues {
            venue.validate()?;
        }
        Ok(config)
    }

    pub fn with_venue(mut self, venue: VenueConfig) -> Self {
        self.venues.push(venue);
        self
    }
}
