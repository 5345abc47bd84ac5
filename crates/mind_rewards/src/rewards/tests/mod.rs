//! Scenario tests for the reward engine.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mind_rewards_proto::RewardEvent;
use rust_decimal_macros::dec;

use super::{
    FixedClock, InMemoryLedger, MemoryRuleStore, RewardConfig, RewardEngine, RewardRuleConfig,
};

mod rebalance;

pub(super) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 2, 9, 0, 0).unwrap()
}

/// Rules used across the scenarios:
/// steps 5 per 1000 (cap 50), book 25, basic course 40, subscription 15
/// (cap 30), referral 10 (cap 30), and an uncategorized daily quiz worth 3.
pub(super) fn fixture_config() -> RewardConfig {
    RewardConfig::default()
        .with_rule("steps", RewardRuleConfig::new(dec!(5), Some(dec!(50))))
        .with_rule("book_completion", RewardRuleConfig::new(dec!(25), None))
        .with_rule(
            "course_completion_basic",
            RewardRuleConfig::new(dec!(40), None),
        )
        .with_rule(
            "partner_subscription",
            RewardRuleConfig::new(dec!(15), Some(dec!(30))),
        )
        .with_rule(
            "referral_bonus",
            RewardRuleConfig::new(dec!(10), Some(dec!(30))),
        )
        .with_rule("daily_quiz", RewardRuleConfig::new(dec!(3), None))
}

pub(super) struct Harness {
    pub engine: RewardEngine<MemoryRuleStore>,
    pub ledger: InMemoryLedger,
    pub clock: Arc<FixedClock>,
}

pub(super) fn harness(config: RewardConfig) -> Harness {
    let clock = Arc::new(FixedClock::new(start_time()));
    let engine = RewardEngine::with_clock(MemoryRuleStore::new(config), clock.clone())
        .expect("engine");
    let mut ledger = InMemoryLedger::with_clock(clock.clone());
    ledger.register_user("user-1");
    ledger.register_user("user-2");
    Harness {
        engine,
        ledger,
        clock,
    }
}

pub(super) fn event(user_id: &str, action_id: &str, key: &str) -> RewardEvent {
    RewardEvent::new(user_id, action_id, key)
}

pub(super) fn steps(user_id: &str, key: &str, count: f64) -> RewardEvent {
    event(user_id, "steps", key).with_value(count)
}
