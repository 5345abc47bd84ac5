//! Daily cap enforcement.

use rust_decimal::Decimal;

/// Headroom left under `cap` once `used` has been granted today.
pub fn remaining_cap(cap: Decimal, used: u64) -> Decimal {
    (cap - Decimal::from(used)).max(Decimal::ZERO)
}

/// Clamp `proposed` to what is left of `daily_cap` today. Uncapped rules pass
/// the proposal through.
pub fn apply_daily_cap(proposed: Decimal, daily_cap: Option<Decimal>, accumulated: u64) -> Decimal {
    match daily_cap {
        Some(cap) => proposed.min(remaining_cap(cap, accumulated)),
        None => proposed,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{apply_daily_cap, remaining_cap};

    #[test]
    fn uncapped_rule_passes_proposal_through() {
        assert_eq!(apply_daily_cap(dec!(700), None, 10_000), dec!(700));
    }

    #[test]
    fn clamps_to_remaining_headroom() {
        assert_eq!(apply_daily_cap(dec!(30), Some(dec!(50)), 35), dec!(15));
        assert_eq!(apply_daily_cap(dec!(10), Some(dec!(50)), 35), dec!(10));
    }

    #[test]
    fn exhausted_or_overdrawn_cap_yields_zero() {
        assert_eq!(apply_daily_cap(dec!(5), Some(dec!(50)), 50), Decimal::ZERO);
        assert_eq!(apply_daily_cap(dec!(5), Some(dec!(50)), 80), Decimal::ZERO);
        assert_eq!(remaining_cap(dec!(50), 80), Decimal::ZERO);
    }

    #[test]
    fn cumulative_grants_never_exceed_cap() {
        let cap = dec!(50);
        let mut granted = 0u64;
        for proposed in [dec!(12.6), dec!(20), dec!(9.9), dec!(30), dec!(4)] {
            let clamped = apply_daily_cap(proposed, Some(cap), granted);
            assert!(clamped >= Decimal::ZERO);
            granted += clamped.trunc().to_u64().expect("integral amount");
            assert!(Decimal::from(granted) <= cap);
        }
        assert_eq!(granted, 50);
    }
}
