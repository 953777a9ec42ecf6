use std::time::Duration;

// ===== Launch Parameters =====
/// Fixed USD funding goal. Crossing it ends the pre-launch phase.
pub const TARGET_USD: f64 = 20_000.0;

/// Default contribution currency (native chain token).
pub const DEFAULT_QUOTE_SYMBOL: &str = "SOL";

// ===== Deployment =====
/// Upper bound on a single liquidity deployment call. Expiry counts as a
/// failed deployment.
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the lifecycle event channel.
pub const EVENT_CAPACITY: usize = 128;

// ===== Price Feed =====
/// How long a fetched spot price stays fresh before the feed re-queries.
pub const PRICE_CACHE_DURATION: Duration = Duration::from_secs(5);

/// Interval of the optional background polling task.
pub const PRICE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Last-resort spot price when no quote was ever observed.
pub const FALLBACK_PRICE_USD: f64 = 100.0;

/// Quotes above this are treated as source glitches and dropped.
pub const MAX_PLAUSIBLE_PRICE_USD: f64 = 10_000.0;

/// Consecutive source failures before the feed backs off.
pub const FEED_MAX_FAILURES: u32 = 3;

/// How long the feed stops querying a failing source.
pub const FEED_BACKOFF: Duration = Duration::from_secs(60);
