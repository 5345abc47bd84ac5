//! Monthly emission rebalance.
//!
//! The coefficient is recomputed from the last 30 days of emission against an
//! even spread of the remaining pool over the configured number of months:
//!
//! - more than 10% above target: scale down to `target / actual`
//! - more than 10% below target: scale up to `target / actual`, at most 1
//! - otherwise, or with nothing emitted: unchanged

use chrono::{DateTime, Duration, Utc};
use mind_rewards_proto::{RebalanceDecision, RebalanceReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::config::{RewardConfig, TOTAL_TOKEN_SUPPLY};

pub const EMISSION_WINDOW_DAYS: i64 = 30;
pub const COEFFICIENT_DECIMAL_PLACES: u32 = 4;
pub const MIN_REBALANCE_COEFFICIENT: Decimal = dec!(0.0001);

const UPPER_BAND: Decimal = dec!(1.1);
const LOWER_BAND: Decimal = dec!(0.9);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceInputs {
    pub enabled: bool,
    pub current_coefficient: Decimal,
    pub actual_emission: Decimal,
    pub total_distributed: Decimal,
    pub remaining_pool_months: i64,
}

impl RebalanceInputs {
    pub fn from_config(
        config: &RewardConfig,
        actual_emission: Decimal,
        total_distributed: Decimal,
    ) -> Self {
        Self {
            enabled: config.auto_rebalance.enabled,
            current_coefficient: config.rebalance_coefficient,
            actual_emission,
            total_distributed,
            remaining_pool_months: config.auto_rebalance.remaining_pool_months,
        }
    }
}

/// Start of the emission window ending at `now`.
pub fn emission_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(EMISSION_WINDOW_DAYS)
}

pub fn compute_rebalance(inputs: &RebalanceInputs, now: DateTime<Utc>) -> RebalanceReport {
    let mut report = RebalanceReport {
        executed_at: now,
        decision: RebalanceDecision::Unchanged,
        previous_coefficient: inputs.current_coefficient,
        new_coefficient: inputs.current_coefficient,
        actual_emission: inputs.actual_emission,
        target_emission: None,
        remaining_pool: None,
        remaining_pool_months: inputs.remaining_pool_months,
    };

    if !inputs.enabled {
        report.decision = RebalanceDecision::Disabled;
        return report;
    }

    let remaining_pool = (TOTAL_TOKEN_SUPPLY - inputs.total_distributed).max(Decimal::ZERO);
    report.remaining_pool = Some(remaining_pool);

    if inputs.remaining_pool_months <= 0 {
        report.decision = RebalanceDecision::NoPoolMonths;
        return report;
    }

    let target = remaining_pool / Decimal::from(inputs.remaining_pool_months);
    report.target_emission = Some(target);

    let actual = inputs.actual_emission;
    if actual <= Decimal::ZERO {
        return report;
    }
    let Some(ratio) = target.checked_div(actual) else {
        return report;
    };
    let ratio = ratio
        .round_dp(COEFFICIENT_DECIMAL_PLACES)
        .max(MIN_REBALANCE_COEFFICIENT);

    if actual > target * UPPER_BAND {
        // Hot emission never raises a coefficient that is already lower.
        if ratio < inputs.current_coefficient {
            report.decision = RebalanceDecision::ScaleDown;
            report.new_coefficient = ratio;
        }
    } else if actual < target * LOWER_BAND {
        report.decision = RebalanceDecision::ScaleUp;
        report.new_coefficient = ratio.min(Decimal::ONE);
    }
    report
}
