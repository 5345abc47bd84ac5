//! Base reward computation. Pure: no storage, no clock.

use mind_rewards_proto::{ActionKind, RewardEvent};
use rust_decimal::Decimal;

use super::config::RewardRule;

pub const STEPS_PER_REWARD_UNIT: u64 = 1_000;
pub const BOOK_COMPLETION_THRESHOLD: f64 = 0.80;

/// Reward for `event` under `rule`, before the rebalance coefficient and the
/// daily cap are applied. Never negative.
pub fn calculate_base_reward(event: &RewardEvent, rule: &RewardRule) -> Decimal {
    let amount = match event.action() {
        ActionKind::Steps => {
            let units = step_count(event.value) / STEPS_PER_REWARD_UNIT;
            Decimal::from(units) * rule.base_reward
        }
        ActionKind::BookCompletion => {
            if book_progress_reached(event.value) {
                rule.base_reward
            } else {
                Decimal::ZERO
            }
        }
        ActionKind::CourseCompletion(_)
        | ActionKind::PartnerSubscription
        | ActionKind::ReferralBonus
        | ActionKind::Custom(_) => rule.base_reward,
    };
    amount.max(Decimal::ZERO)
}

/// Whole steps carried by the event value. Fractions are truncated; missing,
/// negative and non-finite values count as zero steps.
fn step_count(value: Option<f64>) -> u64 {
    match value {
        Some(raw) if raw.is_finite() && raw > 0.0 => raw.trunc() as u64,
        _ => 0,
    }
}

// Progress outside 0.0..=1.0 is compared as given.
fn book_progress_reached(value: Option<f64>) -> bool {
    value.unwrap_or(0.0) >= BOOK_COMPLETION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use mind_rewards_proto::RewardEvent;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::calculate_base_reward;
    use crate::rewards::RewardRule;

    fn rule(action_id: &str, base_reward: Decimal) -> RewardRule {
        RewardRule {
            action_id: action_id.to_string(),
            base_reward,
            daily_cap: None,
        }
    }

    fn event(action_id: &str, value: Option<f64>) -> RewardEvent {
        let event = RewardEvent::new("user-1", action_id, "key-1");
        match value {
            Some(value) => event.with_value(value),
            None => event,
        }
    }

    #[test]
    fn steps_reward_counts_whole_thousands() {
        let steps = rule("steps", dec!(5));
        assert_eq!(
            calculate_base_reward(&event("steps", Some(2500.0)), &steps),
            dec!(10)
        );
        assert_eq!(
            calculate_base_reward(&event("steps", Some(999.9)), &steps),
            Decimal::ZERO
        );
        assert_eq!(
            calculate_base_reward(&event("steps", Some(3999.99)), &steps),
            dec!(15)
        );
    }

    #[test]
    fn steps_without_usable_value_yield_zero() {
        let steps = rule("steps", dec!(1));
        for value in [None, Some(-4000.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(
                calculate_base_reward(&event("steps", value), &steps),
                Decimal::ZERO
            );
        }
    }

    #[test]
    fn book_completion_requires_eighty_percent() {
        let book = rule("book_completion", dec!(25));
        assert_eq!(
            calculate_base_reward(&event("book_completion", Some(0.79)), &book),
            Decimal::ZERO
        );
        assert_eq!(
            calculate_base_reward(&event("book_completion", Some(0.80)), &book),
            dec!(25)
        );
        assert_eq!(
            calculate_base_reward(&event("book_completion", None), &book),
            Decimal::ZERO
        );
    }

    #[test]
    fn out_of_range_progress_is_compared_as_given() {
        let book = rule("book_completion", dec!(25));
        assert_eq!(
            calculate_base_reward(&event("book_completion", Some(3.5)), &book),
            dec!(25)
        );
    }

    #[test]
    fn other_actions_get_flat_reward_regardless_of_value() {
        let course = rule("course_completion_advanced", dec!(120));
        assert_eq!(
            calculate_base_reward(&event("course_completion_advanced", Some(0.1)), &course),
            dec!(120)
        );
        let custom = rule("daily_quiz", dec!(2.5));
        assert_eq!(
            calculate_base_reward(&event("daily_quiz", None), &custom),
            dec!(2.5)
        );
    }
}
