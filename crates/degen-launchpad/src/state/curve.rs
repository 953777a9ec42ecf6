use crate::constants::{DEFAULT_QUOTE_SYMBOL, TARGET_USD};
use crate::errors::CurveError;
use crate::utils::validation::ensure_positive;

/// Launch lifecycle of a bonding curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveStatus {
    /// Collecting contributions, threshold not yet crossed
    PreLaunch,
    /// Threshold crossed, deployment in flight; contributions are rejected
    Launching,
    /// Liquidity deployed; totals are frozen history
    Launched,
    /// Deployment failed; totals kept, a manual retry may still launch
    Failed,
}

impl Default for CurveStatus {
    fn default() -> Self {
        CurveStatus::PreLaunch
    }
}

/// Immutable curve parameters fixed at token creation.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveParameters {
    /// USD funding goal
    pub target_usd: f64,
    /// Contribution currency identifier
    pub quote_symbol: String,
}

impl CurveParameters {
    pub fn new(target_usd: f64, quote_symbol: impl Into<String>) -> Result<Self, CurveError> {
        ensure_positive("target USD", target_usd)?;
        Ok(Self {
            target_usd,
            quote_symbol: quote_symbol.into(),
        })
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        ensure_positive("target USD", self.target_usd)
    }
}

impl Default for CurveParameters {
    fn default() -> Self {
        Self {
            target_usd: TARGET_USD,
            quote_symbol: DEFAULT_QUOTE_SYMBOL.to_owned(),
        }
    }
}

/// Mutable curve state, one per token, owned exclusively by the controller.
#[derive(Clone, Debug)]
pub struct CurveState {
    pub params: CurveParameters,

    /// Cumulative quote-asset contributed. Non-decreasing while pre-launch,
    /// frozen once launched.
    pub total_contributed_quote: f64,

    /// One increment per accepted contribution, repeats included.
    pub contributor_count: u32,

    /// Latest known USD price of one unit of quote asset, supplied externally.
    pub spot_price_usd: f64,

    /// Current lifecycle status
    pub status: CurveStatus,

    /// Deployment handle, set only on a successful launch.
    pub deployment_reference: Option<String>,
}

impl CurveState {
    pub fn new(params: CurveParameters, spot_price_usd: f64) -> Self {
        Self {
            params,
            total_contributed_quote: 0.0,
            contributor_count: 0,
            spot_price_usd,
            status: CurveStatus::default(),
            deployment_reference: None,
        }
    }

    /// Quote-asset funding target. Always derived from the latest spot price,
    /// never stored.
    pub fn target_amount_quote(&self) -> f64 {
        self.params.target_usd / self.spot_price_usd
    }

    /// USD value of the pool at the latest known spot price.
    pub fn raised_usd(&self) -> f64 {
        self.total_contributed_quote * self.spot_price_usd
    }

    /// Fill ratio against the derived quote target. Unclamped: values above
    /// 1.0 are a valid transient between crossing and launch processing.
    pub fn progress_ratio(&self) -> f64 {
        self.total_contributed_quote / self.target_amount_quote()
    }

    /// Marginal token price in quote-asset units at the current fill level.
    pub fn current_price_quote(&self) -> f64 {
        let x = self.total_contributed_quote;
        x * x / (2.0 * self.target_amount_quote())
    }

    /// Marginal token price in USD at the current fill level.
    pub fn current_price_usd(&self) -> f64 {
        self.current_price_quote() * self.spot_price_usd
    }

    /// The sole launch condition: pool USD value has met the USD goal.
    pub fn threshold_reached(&self) -> bool {
        self.raised_usd() >= self.params.target_usd
    }

    pub fn is_pre_launch(&self) -> bool {
        self.status == CurveStatus::PreLaunch
    }

    pub fn is_launched(&self) -> bool {
        self.status == CurveStatus::Launched
    }

    pub fn is_failed(&self) -> bool {
        self.status == CurveStatus::Failed
    }

    /// Read-only view with all derived values, for UI and chart collaborators.
    pub fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot {
            status: self.status,
            target_usd: self.params.target_usd,
            quote_symbol: self.params.quote_symbol.clone(),
            total_contributed_quote: self.total_contributed_quote,
            contributor_count: self.contributor_count,
            spot_price_usd: self.spot_price_usd,
            target_amount_quote: self.target_amount_quote(),
            raised_usd: self.raised_usd(),
            progress_ratio: self.progress_ratio(),
            current_price_quote: self.current_price_quote(),
            current_price_usd: self.current_price_usd(),
            deployment_reference: self.deployment_reference.clone(),
        }
    }
}

/// Point-in-time view of a curve, including derived values.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveSnapshot {
    pub status: CurveStatus,
    pub target_usd: f64,
    pub quote_symbol: String,
    pub total_contributed_quote: f64,
    pub contributor_count: u32,
    pub spot_price_usd: f64,
    pub target_amount_quote: f64,
    pub raised_usd: f64,
    pub progress_ratio: f64,
    pub current_price_quote: f64,
    pub current_price_usd: f64,
    pub deployment_reference: Option<String>,
}
