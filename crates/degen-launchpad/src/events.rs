use crate::state::TokenId;

// =============================================================================
// CURVE LIFECYCLE EVENTS
// =============================================================================

/// What pushed a curve over its funding threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchTrigger {
    /// A contribution raised the pool past the USD target.
    Contribution,
    /// A spot price movement alone shrank the quote-asset target below the
    /// amount already contributed.
    PriceRefresh,
    /// A manual re-attempt after a failed deployment.
    Retry,
}

/// Lifecycle events published on the controller's broadcast channel.
#[derive(Clone, Debug)]
pub enum CurveEvent {
    /// A new curve entered tracking at zero contributions.
    Initialized {
        token: TokenId,
        /// USD funding goal
        target_usd: f64,
        /// Initial quote-asset spot price
        spot_price_usd: f64,
    },

    /// A contribution was accepted and priced on the curve.
    ContributionAccepted {
        token: TokenId,
        /// Quote-asset amount contributed
        amount_quote: f64,
        /// Tokens minted for this contribution
        tokens_minted: f64,
        /// Pool total after this contribution
        total_contributed_quote: f64,
        /// Accepted contributions so far
        contributor_count: u32,
        /// USD value of the pool after this contribution
        raised_usd: f64,
    },

    /// The externally supplied spot price changed.
    PriceRefreshed {
        token: TokenId,
        /// New quote-asset spot price
        spot_price_usd: f64,
        /// Re-derived quote-asset funding target
        target_amount_quote: f64,
    },

    /// The funding threshold was crossed and deployment is about to run.
    LaunchTriggered {
        token: TokenId,
        trigger: LaunchTrigger,
        /// USD value of the pool at the moment of crossing
        raised_usd: f64,
    },

    /// Liquidity was deployed and the curve is now a launched instrument.
    DeploymentSucceeded {
        token: TokenId,
        /// Opaque handle returned by the deployer (e.g. a transaction hash)
        reference: String,
    },

    /// The deployment collaborator failed or timed out.
    DeploymentFailed {
        token: TokenId,
        reason: String,
    },
}
