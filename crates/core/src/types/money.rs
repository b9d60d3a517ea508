//! Money arithmetic for order totals and discounts.
//!
//! All monetary amounts are [`Decimal`] values denominated in USD. The
//! dealership sells cars; totals are large and discounts are
//! percentage-based, so the only arithmetic of interest lives here.

use rust_decimal::{Decimal, RoundingStrategy};

/// Apply a percentage discount to a total.
///
/// The result is rounded half-away-from-zero to whole currency units, so a
/// total of 999 with a 10% discount comes to 899 (899.1 rounds down) and a
/// total of 995 with a 10% discount comes to 896 (895.5 rounds up). This is
/// the single authoritative rounding rule; order confirmation and receipt
/// rendering both go through it.
///
/// `percentage` is expected in the 1..=100 range; values outside it are the
/// caller's validation bug, not this function's concern.
#[must_use]
pub fn discounted_total(total: Decimal, percentage: i16) -> Decimal {
    let fraction = Decimal::from(percentage) / Decimal::from(100);
    let discounted = total * (Decimal::ONE - fraction);
    discounted.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for customer-facing email copy, e.g. `$50000`.
///
/// Whole amounts print without decimals; fractional amounts keep two places.
#[must_use]
pub fn display_usd(amount: Decimal) -> String {
    if amount.fract().is_zero() {
        format!("${}", amount.trunc())
    } else {
        format!("${amount:.2}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_discount() {
        assert_eq!(
            discounted_total(Decimal::from(1000), 10),
            Decimal::from(900)
        );
    }

    #[test]
    fn test_rounds_down_below_midpoint() {
        // 999 * 0.9 = 899.1
        assert_eq!(discounted_total(Decimal::from(999), 10), Decimal::from(899));
    }

    #[test]
    fn test_rounds_midpoint_away_from_zero() {
        // 995 * 0.9 = 895.5
        assert_eq!(discounted_total(Decimal::from(995), 10), Decimal::from(896));
    }

    #[test]
    fn test_full_discount() {
        assert_eq!(discounted_total(Decimal::from(50000), 100), Decimal::ZERO);
    }

    #[test]
    fn test_small_percentage_on_large_total() {
        // The thank-you code: 2% off a 50000 car
        assert_eq!(
            discounted_total(Decimal::from(50000), 2),
            Decimal::from(49000)
        );
    }

    #[test]
    fn test_display_usd_whole() {
        assert_eq!(display_usd(Decimal::from(50000)), "$50000");
    }

    #[test]
    fn test_display_usd_fractional() {
        // 1234.50
        assert_eq!(display_usd(Decimal::new(12345, 1)), "$1234.50");
    }
}
