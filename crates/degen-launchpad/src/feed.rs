//! Spot price feed: an injected service with an explicit latest/subscribe
//! contract. The curve core never fetches a price itself; callers wire the
//! feed's updates into `LaunchController::refresh_price`.
//!
//! Degradation policy: a transient source failure serves the last known
//! price, never zero and never an error. Only when no quote was ever
//! observed does the hard fallback apply.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::constants::{
    FALLBACK_PRICE_USD, FEED_BACKOFF, FEED_MAX_FAILURES, MAX_PLAUSIBLE_PRICE_USD,
    PRICE_CACHE_DURATION, PRICE_POLL_INTERVAL,
};
use crate::errors::FeedError;

/// External quote source (an HTTP oracle in the original deployment).
pub trait PriceSource: Send + Sync + 'static {
    /// Fetch the current USD price of one unit of quote asset.
    fn fetch_price_usd(&self) -> impl Future<Output = Result<f64, FeedError>> + Send;
}

/// Feed tunables.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// How long a fetched price stays fresh.
    pub cache_duration: Duration,
    /// Interval of the background polling task.
    pub poll_interval: Duration,
    /// Served only when no price was ever observed.
    pub fallback_price_usd: f64,
    /// Quotes above this bound are treated as source glitches.
    pub max_plausible_price_usd: f64,
    /// Consecutive failures before backing off.
    pub max_failures: u32,
    /// How long to stop querying a failing source.
    pub backoff: Duration,
    /// Capacity of the price update channel.
    pub update_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_duration: PRICE_CACHE_DURATION,
            poll_interval: PRICE_POLL_INTERVAL,
            fallback_price_usd: FALLBACK_PRICE_USD,
            max_plausible_price_usd: MAX_PLAUSIBLE_PRICE_USD,
            max_failures: FEED_MAX_FAILURES,
            backoff: FEED_BACKOFF,
            update_capacity: crate::constants::EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
struct FeedCache {
    price: Option<f64>,
    fetched_at: Option<Instant>,
    failures: u32,
    last_failure: Option<Instant>,
}

pub struct PriceFeed<S: PriceSource> {
    source: Arc<S>,
    config: FeedConfig,
    cache: Mutex<FeedCache>,
    updates_tx: broadcast::Sender<f64>,
}

impl<S: PriceSource> PriceFeed<S> {
    pub fn new(source: Arc<S>, config: FeedConfig) -> Arc<Self> {
        let (updates_tx, _) = broadcast::channel(config.update_capacity);
        Arc::new(Self {
            source,
            config,
            cache: Mutex::new(FeedCache::default()),
            updates_tx,
        })
    }

    /// Subscribe to successfully refreshed prices.
    pub fn subscribe(&self) -> broadcast::Receiver<f64> {
        self.updates_tx.subscribe()
    }

    /// Last successfully observed price, if any.
    pub fn last_known(&self) -> Option<f64> {
        self.cache.lock().price
    }

    /// Current spot price. Serves the cache while fresh, refreshes from the
    /// source otherwise, and degrades to the last known price (or the
    /// configured fallback) instead of failing.
    pub async fn latest(&self) -> f64 {
        if let Some(price) = self.fresh_or_backoff() {
            return price;
        }

        match self.source.fetch_price_usd().await {
            Ok(price) => match self.validate(price) {
                Ok(()) => self.record_success(price),
                Err(err) => {
                    log::warn!("price source returned a bad quote: {err}");
                    self.record_failure()
                }
            },
            Err(err) => {
                log::warn!("price source failed: {err}");
                self.record_failure()
            }
        }
    }

    /// Spawn a task refreshing the price on the configured interval, pushing
    /// each successful refresh to subscribers. Abort the handle to stop.
    pub fn start_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let feed = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(feed.config.poll_interval);
            loop {
                ticker.tick().await;
                let _ = feed.latest().await;
            }
        })
    }

    /// Returns a served price when the cache is fresh or the source is in a
    /// backoff window; `None` means a fetch should happen.
    fn fresh_or_backoff(&self) -> Option<f64> {
        let mut cache = self.cache.lock();

        if let (Some(price), Some(at)) = (cache.price, cache.fetched_at) {
            if at.elapsed() < self.config.cache_duration {
                return Some(price);
            }
        }

        if cache.failures >= self.config.max_failures {
            if let Some(last) = cache.last_failure {
                if last.elapsed() < self.config.backoff {
                    return Some(cache.price.unwrap_or(self.config.fallback_price_usd));
                }
            }
            // Backoff window elapsed; allow the source another try.
            cache.failures = 0;
        }

        None
    }

    fn validate(&self, price: f64) -> Result<(), FeedError> {
        if !price.is_finite() || price <= 0.0 || price > self.config.max_plausible_price_usd {
            return Err(FeedError::InvalidPrice(price));
        }
        Ok(())
    }

    fn record_success(&self, price: f64) -> f64 {
        {
            let mut cache = self.cache.lock();
            cache.price = Some(price);
            cache.fetched_at = Some(Instant::now());
            cache.failures = 0;
            cache.last_failure = None;
        }
        let _ = self.updates_tx.send(price);
        price
    }

    fn record_failure(&self) -> f64 {
        let mut cache = self.cache.lock();
        cache.failures += 1;
        cache.last_failure = Some(Instant::now());

        match cache.price {
            Some(price) => {
                log::info!("serving last known spot price {price}");
                price
            }
            None => {
                log::info!(
                    "no spot price observed yet, serving fallback {}",
                    self.config.fallback_price_usd
                );
                self.config.fallback_price_usd
            }
        }
    }
}
