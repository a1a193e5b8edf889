//! Request dispatcher
//!
//! Every outbound venue call passes through `RequestDispatcher::execute`:
//! rate-limit admission, signing (authenticated channel only), then the transport
//! call bounded by the configured timeout. The outcome is classified, never retried.
//! One dispatch consumes one rate-limit slot whatever the outcome.

use crate::errors::{ExchangeError, Result};
use crate::http::{HttpRequest, HttpResponse, Method};
use crate::rate_limit::{Channel, RateLimiter};
use crate::traits::{RequestSigner, Transport};
use multivenue_core::{log_dispatch, log_latency, PerfTimer, RequestId};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Dispatch counters, one set per dispatcher
#[derive(Debug, Default)]
pub struct DispatchStats {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    venue_errors: AtomicU64,
    transport_errors: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time copy of `DispatchStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub dispatched: u64,
    pub succeeded: u64,
    pub venue_errors: u64,
    pub transport_errors: u64,
    pub timeouts: u64,
}

impl DispatchStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            venue_errors: self.venue_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

pub struct RequestDispatcher {
    venue: String,
    base_url: Url,
    transport: Rc<dyn Transport>,
    signer: Option<Box<dyn RequestSigner>>,
    limiter: RateLimiter,
    timeout: Duration,
    verbose: bool,
    stats: DispatchStats,
}

impl RequestDispatcher {
    pub fn new(
        venue: impl Into<String>,
        base_url: &str,
        transport: Rc<dyn Transport>,
        limiter: RateLimiter,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            venue: venue.into(),
            base_url,
            transport,
            signer: None,
            limiter,
            timeout,
            verbose: false,
            stats: DispatchStats::default(),
        })
    }

    /// Log latency and the response body of every dispatch
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_signer(mut self, signer: Box<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Absolute URL for an endpoint path relative to the venue base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub fn request(&self, method: Method, path: &str) -> Result<HttpRequest> {
        Ok(HttpRequest::new(method, self.endpoint(path)?))
    }

    /// Admit, sign, send and classify one request.
    ///
    /// Success means a 2xx status; any other status is `Venue { code: status }`.
    pub async fn execute(&self, channel: Channel, mut request: HttpRequest) -> Result<HttpResponse> {
        let signer = match channel {
            Channel::Authenticated => Some(self.signer.as_deref().ok_or_else(|| {
                ExchangeError::MissingCredentials(format!("{} authenticated endpoints need API keys", self.venue))
            })?),
            Channel::Public => None,
        };

        self.limiter.acquire(channel).await?;

        if let Some(signer) = signer {
            signer.sign(&mut request)?;
        }

        let id = RequestId::new();
        let method = request.method;
        let path = request.url.path().to_string();
        log_dispatch!(id, self.venue, channel, method, path);
        DispatchStats::bump(&self.stats.dispatched);

        let timer = PerfTimer::start(format!("{} {} {}", self.venue, method, path));
        let outcome = monoio::time::timeout(self.timeout, self.transport.perform(request)).await;

        if self.verbose {
            log_latency!(format!("{id} {} {method} {path}", self.venue), timer.elapsed_micros());
            if let Ok(Ok(response)) = &outcome {
                debug!("{id} <- {} {}", response.status, response.body);
            }
        }

        match outcome {
            Err(_elapsed) => {
                DispatchStats::bump(&self.stats.timeouts);
                warn!("⌛ {} {} {} timed out after {:?}", self.venue, method, path, self.timeout);
                Err(ExchangeError::Timeout(format!("{method} {path} exceeded {}ms", self.timeout.as_millis())))
            }
            Ok(Err(e)) => {
                DispatchStats::bump(&self.stats.transport_errors);
                Err(e)
            }
            Ok(Ok(response)) if response.is_success() => {
                DispatchStats::bump(&self.stats.succeeded);
                Ok(response)
            }
            Ok(Ok(response)) => {
                DispatchStats::bump(&self.stats.venue_errors);
                debug!("{} {} {} -> {}", self.venue, method, path, response.status);
                Err(ExchangeError::venue(response.status.to_string(), response.body))
            }
        }
    }
}
