use std::future::Future;

use crate::errors::DeployError;
use crate::state::TokenId;

/// Handle returned by a successful deployment (e.g. a transaction hash).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub reference: String,
}

/// Liquidity deployment collaborator. Invoked at most once per launch edge;
/// the call is a network effect and may be slow, so the controller bounds it
/// with a timeout.
pub trait LiquidityDeployer: Send + Sync + 'static {
    /// Create the trading pool for `token`, seeding it with the full
    /// contributed quote amount.
    fn deploy(
        &self,
        token: &TokenId,
        quote_amount: f64,
    ) -> impl Future<Output = Result<DeploymentReceipt, DeployError>> + Send;
}
