//! Launch controller: owns per-token curve state, applies contributions,
//! reacts to spot price refreshes, and drives the one-shot transition from
//! contribution pool to launched instrument.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, Mutex};

use crate::constants::{DEPLOY_TIMEOUT, EVENT_CAPACITY};
use crate::curve;
use crate::deploy::LiquidityDeployer;
use crate::errors::{CurveError, DeployError};
use crate::events::{CurveEvent, LaunchTrigger};
use crate::state::{CurveParameters, CurveSnapshot, CurveState, CurveStatus, TokenId};
use crate::utils::validation::ensure_positive;

/// Controller tunables.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Bound on a single deployment call; expiry counts as failure.
    pub deploy_timeout: Duration,
    /// Capacity of the lifecycle event channel.
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deploy_timeout: DEPLOY_TIMEOUT,
            event_capacity: EVENT_CAPACITY,
        }
    }
}

/// Result of an accepted contribution.
#[derive(Clone, Debug)]
pub struct ContributionOutcome {
    /// Tokens minted for this contribution at the averaged marginal price.
    pub tokens_minted: f64,
    /// Curve state after the contribution (and launch, if one was triggered).
    pub snapshot: CurveSnapshot,
}

/// Per-token serialization point: all mutations of one curve go through
/// `exec`, so a contribution and a price refresh can never interleave their
/// read-modify-write of the state. Snapshots read `state` directly and never
/// wait on an in-flight deployment.
struct CurveSlot {
    exec: Mutex<()>,
    state: RwLock<CurveState>,
}

pub struct LaunchController<D: LiquidityDeployer> {
    deployer: Arc<D>,
    config: ControllerConfig,
    curves: RwLock<BTreeMap<TokenId, Arc<CurveSlot>>>,
    events_tx: broadcast::Sender<CurveEvent>,
}

impl<D: LiquidityDeployer> LaunchController<D> {
    pub fn new(deployer: Arc<D>, config: ControllerConfig) -> Arc<Self> {
        let (events_tx, _) = broadcast::channel(config.event_capacity);
        Arc::new(Self {
            deployer,
            config,
            curves: RwLock::new(BTreeMap::new()),
            events_tx,
        })
    }

    /// Subscribe to lifecycle events for all tracked curves.
    pub fn subscribe(&self) -> broadcast::Receiver<CurveEvent> {
        self.events_tx.subscribe()
    }

    /// Start tracking a token at zero contributions.
    pub fn initialize(
        &self,
        token: TokenId,
        params: CurveParameters,
        initial_spot_price_usd: f64,
    ) -> Result<CurveSnapshot, CurveError> {
        params.validate()?;
        ensure_positive("spot price", initial_spot_price_usd)?;

        let mut curves = self.curves.write();
        if curves.contains_key(&token) {
            return Err(CurveError::InvalidState(format!(
                "curve for token {token} already tracked"
            )));
        }

        let state = CurveState::new(params, initial_spot_price_usd);
        let snapshot = state.snapshot();
        curves.insert(
            token.clone(),
            Arc::new(CurveSlot {
                exec: Mutex::new(()),
                state: RwLock::new(state),
            }),
        );

        log::info!(
            "curve initialized for {token}: target {} USD at spot {} USD",
            snapshot.target_usd,
            snapshot.spot_price_usd
        );
        let _ = self.events_tx.send(CurveEvent::Initialized {
            token,
            target_usd: snapshot.target_usd,
            spot_price_usd: snapshot.spot_price_usd,
        });

        Ok(snapshot)
    }

    /// Apply a contribution. Accepted only while pre-launch; if the USD
    /// threshold is crossed the launch runs synchronously within this call.
    pub async fn apply_contribution(
        &self,
        token: &TokenId,
        amount_quote: f64,
    ) -> Result<ContributionOutcome, CurveError> {
        ensure_positive("contribution amount", amount_quote)?;
        let slot = self.slot(token)?;
        let _exec = slot.exec.lock().await;

        let (tokens_minted, crossed) = {
            let mut state = slot.state.write();
            if !state.is_pre_launch() {
                return Err(CurveError::InvalidState(format!(
                    "contributions are closed for {token}: status is {:?}",
                    state.status
                )));
            }

            // Always price against the latest known spot; it may have been
            // refreshed since the caller last read a snapshot.
            let tokens = curve::tokens_for_contribution(
                amount_quote,
                state.total_contributed_quote,
                state.target_amount_quote(),
            )?;

            state.total_contributed_quote += amount_quote;
            state.contributor_count += 1;

            log::info!(
                "contribution of {amount_quote} {} accepted for {token}: raised {} / {} USD",
                state.params.quote_symbol,
                state.raised_usd(),
                state.params.target_usd
            );
            let _ = self.events_tx.send(CurveEvent::ContributionAccepted {
                token: token.clone(),
                amount_quote,
                tokens_minted: tokens,
                total_contributed_quote: state.total_contributed_quote,
                contributor_count: state.contributor_count,
                raised_usd: state.raised_usd(),
            });

            (tokens, state.threshold_reached())
        };

        if crossed {
            self.begin_launch(token, &slot, LaunchTrigger::Contribution);
            self.run_deployment(token, &slot).await?;
        }

        let snapshot = slot.state.read().snapshot();
        Ok(ContributionOutcome {
            tokens_minted,
            snapshot,
        })
    }

    /// Refresh the externally supplied spot price. Shares the contribution
    /// serialization point; a price movement alone can launch the token,
    /// since the USD goal is fixed while the quote-asset target floats.
    pub async fn refresh_price(
        &self,
        token: &TokenId,
        new_spot_price_usd: f64,
    ) -> Result<CurveSnapshot, CurveError> {
        ensure_positive("spot price", new_spot_price_usd)?;
        let slot = self.slot(token)?;
        let _exec = slot.exec.lock().await;

        let crossed = {
            let mut state = slot.state.write();
            state.spot_price_usd = new_spot_price_usd;

            let _ = self.events_tx.send(CurveEvent::PriceRefreshed {
                token: token.clone(),
                spot_price_usd: new_spot_price_usd,
                target_amount_quote: state.target_amount_quote(),
            });

            state.is_pre_launch() && state.threshold_reached()
        };

        if crossed {
            self.begin_launch(token, &slot, LaunchTrigger::PriceRefresh);
            self.run_deployment(token, &slot).await?;
        }

        let snapshot = slot.state.read().snapshot();
        Ok(snapshot)
    }

    /// Re-attempt a failed deployment. No automatic retries happen; this is
    /// the explicit entry point behind a "retry" action.
    pub async fn retry_deployment(&self, token: &TokenId) -> Result<CurveSnapshot, CurveError> {
        let slot = self.slot(token)?;
        let _exec = slot.exec.lock().await;

        {
            let state = slot.state.read();
            if !state.is_failed() {
                return Err(CurveError::InvalidState(format!(
                    "retry requires a failed deployment for {token}, status is {:?}",
                    state.status
                )));
            }
            let _ = self.events_tx.send(CurveEvent::LaunchTriggered {
                token: token.clone(),
                trigger: LaunchTrigger::Retry,
                raised_usd: state.raised_usd(),
            });
        }

        self.run_deployment(token, &slot).await?;
        let snapshot = slot.state.read().snapshot();
        Ok(snapshot)
    }

    /// Read-only view of a curve with all derived values.
    pub fn snapshot(&self, token: &TokenId) -> Result<CurveSnapshot, CurveError> {
        let slot = self.slot(token)?;
        let state = slot.state.read();
        Ok(state.snapshot())
    }

    /// Preview the tokens a contribution would mint at the current state.
    /// Pure read; does not move the curve.
    pub fn quote_contribution(
        &self,
        token: &TokenId,
        amount_quote: f64,
    ) -> Result<f64, CurveError> {
        let slot = self.slot(token)?;
        let state = slot.state.read();
        curve::tokens_for_contribution(
            amount_quote,
            state.total_contributed_quote,
            state.target_amount_quote(),
        )
    }

    /// Mark the threshold crossing. Deployment is invoked only on this edge;
    /// once the status leaves pre-launch no contribution can re-trigger it.
    fn begin_launch(&self, token: &TokenId, slot: &CurveSlot, trigger: LaunchTrigger) {
        let mut state = slot.state.write();
        state.status = CurveStatus::Launching;

        log::info!(
            "launch threshold crossed for {token} via {trigger:?}: {} USD raised",
            state.raised_usd()
        );
        let _ = self.events_tx.send(CurveEvent::LaunchTriggered {
            token: token.clone(),
            trigger,
            raised_usd: state.raised_usd(),
        });
    }

    /// Run the deployment effect under the configured timeout and record the
    /// outcome. A failure leaves the accepted contributions in place; only
    /// the status moves to `Failed`.
    async fn run_deployment(&self, token: &TokenId, slot: &CurveSlot) -> Result<(), CurveError> {
        let quote_amount = slot.state.read().total_contributed_quote;

        let outcome = match tokio::time::timeout(
            self.config.deploy_timeout,
            self.deployer.deploy(token, quote_amount),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DeployError::TimedOut),
        };

        match outcome {
            Ok(receipt) => {
                let mut state = slot.state.write();
                state.status = CurveStatus::Launched;
                state.deployment_reference = Some(receipt.reference.clone());

                log::info!("liquidity deployed for {token}: {}", receipt.reference);
                let _ = self.events_tx.send(CurveEvent::DeploymentSucceeded {
                    token: token.clone(),
                    reference: receipt.reference,
                });
                Ok(())
            }
            Err(err) => {
                let mut state = slot.state.write();
                state.status = CurveStatus::Failed;

                log::warn!("liquidity deployment failed for {token}: {err}");
                let _ = self.events_tx.send(CurveEvent::DeploymentFailed {
                    token: token.clone(),
                    reason: err.to_string(),
                });
                Err(CurveError::DeploymentFailed(err))
            }
        }
    }

    fn slot(&self, token: &TokenId) -> Result<Arc<CurveSlot>, CurveError> {
        self.curves
            .read()
            .get(token)
            .cloned()
            .ok_or(CurveError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::DeploymentReceipt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockDeployer {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: parking_lot::Mutex<Option<Duration>>,
    }

    impl MockDeployer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: parking_lot::Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }
    }

    impl LiquidityDeployer for MockDeployer {
        fn deploy(
            &self,
            token: &TokenId,
            _quote_amount: f64,
        ) -> impl std::future::Future<Output = Result<DeploymentReceipt, DeployError>> + Send
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail.load(Ordering::SeqCst);
            let delay = *self.delay.lock();
            let token = token.clone();
            async move {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                if fail {
                    Err(DeployError::Rejected("amm unavailable".into()))
                } else {
                    Ok(DeploymentReceipt {
                        reference: format!("tx-{token}"),
                    })
                }
            }
        }
    }

    fn setup() -> (Arc<MockDeployer>, Arc<LaunchController<MockDeployer>>, TokenId) {
        let deployer = MockDeployer::new();
        let controller = LaunchController::new(deployer.clone(), ControllerConfig::default());
        let token = TokenId::from("mint-1");
        controller
            .initialize(token.clone(), CurveParameters::default(), 100.0)
            .unwrap();
        (deployer, controller, token)
    }

    #[tokio::test]
    async fn contribution_moves_the_pool_but_not_the_status() {
        let (deployer, controller, token) = setup();

        let snap = controller.snapshot(&token).unwrap();
        assert_eq!(snap.target_amount_quote, 200.0);

        let outcome = controller.apply_contribution(&token, 50.0).await.unwrap();
        assert_eq!(outcome.snapshot.total_contributed_quote, 50.0);
        assert_eq!(outcome.snapshot.contributor_count, 1);
        assert_eq!(outcome.snapshot.progress_ratio, 0.25);
        assert_eq!(outcome.snapshot.status, CurveStatus::PreLaunch);
        assert_eq!(deployer.calls(), 0);
    }

    #[tokio::test]
    async fn crossing_the_threshold_deploys_once_and_launches() {
        let (deployer, controller, token) = setup();

        controller.apply_contribution(&token, 50.0).await.unwrap();
        let outcome = controller.apply_contribution(&token, 150.0).await.unwrap();

        assert_eq!(outcome.snapshot.total_contributed_quote, 200.0);
        assert_eq!(outcome.snapshot.progress_ratio, 1.0);
        assert_eq!(outcome.snapshot.status, CurveStatus::Launched);
        assert_eq!(
            outcome.snapshot.deployment_reference.as_deref(),
            Some("tx-mint-1")
        );
        assert_eq!(deployer.calls(), 1);

        // Later contributions are rejected and never re-deploy.
        for _ in 0..3 {
            let err = controller.apply_contribution(&token, 10.0).await.unwrap_err();
            assert!(matches!(err, CurveError::InvalidState(_)));
        }
        assert_eq!(deployer.calls(), 1);
        assert_eq!(
            controller.snapshot(&token).unwrap().total_contributed_quote,
            200.0
        );
    }

    #[tokio::test]
    async fn price_drop_raises_target_without_launching() {
        let (deployer, controller, token) = setup();
        controller.apply_contribution(&token, 150.0).await.unwrap();

        let snap = controller.refresh_price(&token, 50.0).await.unwrap();
        assert_eq!(snap.target_amount_quote, 400.0);
        assert_eq!(snap.progress_ratio, 0.375);
        assert_eq!(snap.status, CurveStatus::PreLaunch);
        assert_eq!(deployer.calls(), 0);
    }

    #[tokio::test]
    async fn price_rise_alone_can_launch() {
        let (deployer, controller, token) = setup();
        controller.apply_contribution(&token, 150.0).await.unwrap();

        // 150 SOL * 200 USD = 30_000 USD >= 20_000 USD
        let snap = controller.refresh_price(&token, 200.0).await.unwrap();
        assert_eq!(snap.status, CurveStatus::Launched);
        assert!(snap.deployment_reference.is_some());
        assert_eq!(deployer.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_is_idempotent_for_the_derived_target() {
        let (_, controller, token) = setup();

        let first = controller.refresh_price(&token, 80.0).await.unwrap();
        let second = controller.refresh_price(&token, 80.0).await.unwrap();
        assert_eq!(first.target_amount_quote, second.target_amount_quote);
        assert_eq!(first.progress_ratio, second.progress_ratio);
    }

    #[tokio::test]
    async fn progress_strictly_increases_at_constant_price() {
        let (_, controller, token) = setup();

        let mut last = 0.0;
        for amount in [5.0, 12.5, 40.0, 1.0] {
            let outcome = controller.apply_contribution(&token, amount).await.unwrap();
            assert!(outcome.snapshot.progress_ratio > last);
            last = outcome.snapshot.progress_ratio;
        }
    }

    #[tokio::test]
    async fn rejects_invalid_inputs_without_touching_state() {
        let (_, controller, token) = setup();

        for bad in [-5.0, 0.0, f64::NAN, f64::INFINITY] {
            let err = controller.apply_contribution(&token, bad).await.unwrap_err();
            assert!(matches!(err, CurveError::InvalidParameter(_)));
        }
        let err = controller.refresh_price(&token, 0.0).await.unwrap_err();
        assert!(matches!(err, CurveError::InvalidParameter(_)));

        let snap = controller.snapshot(&token).unwrap();
        assert_eq!(snap.total_contributed_quote, 0.0);
        assert_eq!(snap.contributor_count, 0);
        assert_eq!(snap.spot_price_usd, 100.0);
    }

    #[tokio::test]
    async fn unknown_and_duplicate_tokens_are_rejected() {
        let (_, controller, token) = setup();

        let err = controller.snapshot(&TokenId::from("missing")).unwrap_err();
        assert!(matches!(err, CurveError::NotFound));

        let err = controller
            .initialize(token, CurveParameters::default(), 100.0)
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidState(_)));
    }

    #[tokio::test]
    async fn failed_deployment_keeps_the_contribution_and_allows_retry() {
        let (deployer, controller, token) = setup();
        deployer.set_fail(true);

        let err = controller.apply_contribution(&token, 200.0).await.unwrap_err();
        assert!(matches!(err, CurveError::DeploymentFailed(_)));
        assert_eq!(deployer.calls(), 1);

        // The triggering contribution already happened; nothing is unwound.
        let snap = controller.snapshot(&token).unwrap();
        assert_eq!(snap.status, CurveStatus::Failed);
        assert_eq!(snap.total_contributed_quote, 200.0);
        assert_eq!(snap.contributor_count, 1);
        assert_eq!(snap.deployment_reference, None);

        // No contributions while failed, and no automatic retry.
        let err = controller.apply_contribution(&token, 1.0).await.unwrap_err();
        assert!(matches!(err, CurveError::InvalidState(_)));
        assert_eq!(deployer.calls(), 1);

        // Manual retry succeeds and completes the launch.
        deployer.set_fail(false);
        let snap = controller.retry_deployment(&token).await.unwrap();
        assert_eq!(snap.status, CurveStatus::Launched);
        assert_eq!(snap.deployment_reference.as_deref(), Some("tx-mint-1"));
        assert_eq!(deployer.calls(), 2);
    }

    #[tokio::test]
    async fn retry_requires_a_failed_deployment() {
        let (_, controller, token) = setup();
        let err = controller.retry_deployment(&token).await.unwrap_err();
        assert!(matches!(err, CurveError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_deployment_times_out_into_failed() {
        let deployer = MockDeployer::new();
        deployer.set_delay(Duration::from_secs(120));
        let controller = LaunchController::new(
            deployer.clone(),
            ControllerConfig {
                deploy_timeout: Duration::from_secs(5),
                ..ControllerConfig::default()
            },
        );
        let token = TokenId::from("mint-slow");
        controller
            .initialize(token.clone(), CurveParameters::default(), 100.0)
            .unwrap();

        let err = controller.apply_contribution(&token, 200.0).await.unwrap_err();
        assert!(matches!(
            err,
            CurveError::DeploymentFailed(DeployError::TimedOut)
        ));
        assert_eq!(controller.snapshot(&token).unwrap().status, CurveStatus::Failed);
        assert_eq!(deployer.calls(), 1);
    }

    #[tokio::test]
    async fn preview_quotes_do_not_move_the_curve() {
        let (_, controller, token) = setup();
        controller.apply_contribution(&token, 10.0).await.unwrap();

        let preview = controller.quote_contribution(&token, 25.0).unwrap();
        let expected = curve::tokens_for_contribution(25.0, 10.0, 200.0).unwrap();
        assert_eq!(preview, expected);

        let snap = controller.snapshot(&token).unwrap();
        assert_eq!(snap.total_contributed_quote, 10.0);
        assert_eq!(snap.contributor_count, 1);
    }

    #[tokio::test]
    async fn events_trace_the_launch_lifecycle() {
        let deployer = MockDeployer::new();
        let controller = LaunchController::new(deployer, ControllerConfig::default());
        let mut rx = controller.subscribe();

        let token = TokenId::from("mint-ev");
        controller
            .initialize(token.clone(), CurveParameters::default(), 100.0)
            .unwrap();
        controller.apply_contribution(&token, 200.0).await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), CurveEvent::Initialized { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            CurveEvent::ContributionAccepted { contributor_count: 1, .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            CurveEvent::LaunchTriggered {
                trigger: LaunchTrigger::Contribution,
                ..
            }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            CurveEvent::DeploymentSucceeded { .. }
        ));
    }
}
