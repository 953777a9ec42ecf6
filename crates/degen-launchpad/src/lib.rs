//! Bonding-curve pricing and launch lifecycle for pre-launch tokens.
//!
//! A token in degen mode collects quote-asset contributions against a fixed
//! USD funding goal. Contributions are priced on a quadratic bonding curve;
//! once the pool's USD value crosses the goal, the controller deploys
//! liquidity through an external collaborator exactly once and the curve
//! becomes a launched, read-only instrument.
//!
//! The crate is split into:
//! - [`curve`] — pure pricing math, no side effects;
//! - [`controller`] — the stateful launch controller, one curve per token;
//! - [`feed`] — the injected spot price service with cache and fallback;
//! - [`deploy`] — the liquidity deployment collaborator trait.

pub mod constants;
pub mod controller;
pub mod curve;
pub mod deploy;
pub mod errors;
pub mod events;
pub mod feed;
pub mod state;
pub mod utils;

pub use controller::{ContributionOutcome, ControllerConfig, LaunchController};
pub use deploy::{DeploymentReceipt, LiquidityDeployer};
pub use errors::{CurveError, DeployError, FeedError};
pub use events::{CurveEvent, LaunchTrigger};
pub use feed::{FeedConfig, PriceFeed, PriceSource};
pub use state::{CurveParameters, CurveSnapshot, CurveState, CurveStatus, TokenId};
