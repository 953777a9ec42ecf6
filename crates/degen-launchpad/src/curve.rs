//! Pure bonding-curve math. No side effects, no I/O.
//!
//! The curve is quadratic in the cumulative contribution:
//! `price(x) = x^2 / (2 * target_amount_quote)`, so price rises convexly as
//! the pool fills and early contributors pay less per token.

use crate::errors::CurveError;
use crate::utils::validation::{ensure_non_negative, ensure_positive};

/// Marginal token price, in quote-asset units, at a cumulative contribution
/// level.
pub fn price_at(cumulative_quote: f64, target_amount_quote: f64) -> Result<f64, CurveError> {
    ensure_positive("target amount", target_amount_quote)?;
    ensure_non_negative("cumulative amount", cumulative_quote)?;

    Ok(cumulative_quote * cumulative_quote / (2.0 * target_amount_quote))
}

/// Tokens minted for a contribution, priced at the average of the marginal
/// price just before and just after the contribution.
///
/// This trapezoid over the marginal price is deliberately kept instead of the
/// exact integral (`x^3 / 3`): it is the closed-form O(1) pricing rule the
/// deployed system uses, slight over/under-estimate included.
pub fn tokens_for_contribution(
    contribution_quote: f64,
    cumulative_before: f64,
    target_amount_quote: f64,
) -> Result<f64, CurveError> {
    ensure_positive("contribution amount", contribution_quote)?;

    let price_before = price_at(cumulative_before, target_amount_quote)?;
    let price_after = price_at(cumulative_before + contribution_quote, target_amount_quote)?;
    let avg_price = (price_before + price_after) / 2.0;

    Ok(contribution_quote / avg_price)
}

/// USD value of a quote-asset amount at a given spot price.
pub fn usd_value(quote_amount: f64, spot_price_usd: f64) -> Result<f64, CurveError> {
    ensure_non_negative("quote amount", quote_amount)?;
    ensure_non_negative("spot price", spot_price_usd)?;

    Ok(quote_amount * spot_price_usd)
}

/// Fill ratio of the pool against the quote-asset target. Not clamped;
/// callers clamp for display only.
pub fn progress_ratio(cumulative_quote: f64, target_amount_quote: f64) -> Result<f64, CurveError> {
    ensure_positive("target amount", target_amount_quote)?;
    ensure_non_negative("cumulative amount", cumulative_quote)?;

    Ok(cumulative_quote / target_amount_quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_starts_at_zero_and_is_strictly_increasing() {
        assert_eq!(price_at(0.0, 200.0).unwrap(), 0.0);

        let mut last = -1.0;
        for x in [0.0, 1.0, 10.0, 50.0, 100.0, 200.0, 500.0] {
            let p = price_at(x, 200.0).unwrap();
            assert!(p >= 0.0);
            assert!(p > last, "price must rise with cumulative amount");
            last = p;
        }
    }

    #[test]
    fn price_matches_quadratic_form() {
        // 100^2 / (2 * 200) = 25
        assert_eq!(price_at(100.0, 200.0).unwrap(), 25.0);
        // 200^2 / (2 * 200) = 100
        assert_eq!(price_at(200.0, 200.0).unwrap(), 100.0);
    }

    #[test]
    fn price_rejects_bad_parameters() {
        assert!(price_at(10.0, 0.0).is_err());
        assert!(price_at(10.0, -5.0).is_err());
        assert!(price_at(-1.0, 200.0).is_err());
        assert!(price_at(f64::NAN, 200.0).is_err());
        assert!(price_at(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn tokens_follow_the_averaged_marginal_price() {
        // before = 0, contribution = 10, target = 200:
        // p0 = 0, p1 = 100/400 = 0.25, avg = 0.125, tokens = 10/0.125 = 80
        let tokens = tokens_for_contribution(10.0, 0.0, 200.0).unwrap();
        assert_eq!(tokens, 80.0);

        // Closed-form check against the averaging formula at a non-zero start.
        let (c, before, target) = (25.0, 50.0, 200.0);
        let p0 = price_at(before, target).unwrap();
        let p1 = price_at(before + c, target).unwrap();
        let expected = c / ((p0 + p1) / 2.0);
        assert_eq!(tokens_for_contribution(c, before, target).unwrap(), expected);
    }

    #[test]
    fn small_contributions_at_the_default_target() {
        // At target_usd 20_000 and spot 100 the quote target is 200; a small
        // first contribution mints 4 * target / c tokens under the trapezoid.
        let c = 0.5;
        let tokens = tokens_for_contribution(c, 0.0, 200.0).unwrap();
        assert_eq!(tokens, 4.0 * 200.0 / c);
    }

    #[test]
    fn tokens_rejects_non_positive_contribution() {
        assert!(tokens_for_contribution(0.0, 10.0, 200.0).is_err());
        assert!(tokens_for_contribution(-5.0, 10.0, 200.0).is_err());
    }

    #[test]
    fn usd_value_is_a_guarded_product() {
        assert_eq!(usd_value(50.0, 100.0).unwrap(), 5_000.0);
        assert_eq!(usd_value(0.0, 100.0).unwrap(), 0.0);
        assert!(usd_value(-1.0, 100.0).is_err());
        assert!(usd_value(50.0, -0.5).is_err());
    }

    #[test]
    fn progress_ratio_is_unclamped() {
        assert_eq!(progress_ratio(50.0, 200.0).unwrap(), 0.25);
        assert_eq!(progress_ratio(250.0, 200.0).unwrap(), 1.25);
        assert!(progress_ratio(50.0, 0.0).is_err());
    }
}
