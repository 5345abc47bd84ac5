use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceDecision {
    /// `auto_rebalance.enabled` is off.
    Disabled,
    /// `remaining_pool_months` is not positive.
    NoPoolMonths,
    ScaleDown,
    ScaleUp,
    /// Emission within the ±10% band, or nothing emitted.
    Unchanged,
}

/// Outcome of one monthly rebalance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub executed_at: DateTime<Utc>,
    pub decision: RebalanceDecision,
    pub previous_coefficient: Decimal,
    pub new_coefficient: Decimal,
    pub actual_emission: Decimal,
    pub target_emission: Option<Decimal>,
    pub remaining_pool: Option<Decimal>,
    pub remaining_pool_months: i64,
}

impl RebalanceReport {
    pub fn changed(&self) -> bool {
        self.new_coefficient != self.previous_coefficient
    }
}
