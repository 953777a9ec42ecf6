use thiserror::Error;

/// Errors surfaced by the curve model and the launch controller.
#[derive(Error, Debug)]
pub enum CurveError {
    // ===== Parameter Errors =====
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // ===== Status Errors =====
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("no curve tracked for this token")]
    NotFound,

    // ===== Deployment Errors =====
    /// The only error that mutates state: the triggering contribution has
    /// already been counted and is not rolled back.
    #[error("liquidity deployment failed: {0}")]
    DeploymentFailed(#[from] DeployError),
}

/// Failure reported by the liquidity deployment collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("deployment rejected: {0}")]
    Rejected(String),

    #[error("deployment timed out")]
    TimedOut,
}

/// Failure reported by a spot price source. The feed never propagates these
/// to callers; it degrades to the last known price instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("price source unavailable: {0}")]
    Unavailable(String),

    #[error("implausible spot price: {0}")]
    InvalidPrice(f64),
}
