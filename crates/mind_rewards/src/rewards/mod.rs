//! MIND reward engine.
//!
//! This module contains the [`RewardEngine`] and the pieces it is built from:
//! - rule document loading and save-back ([`RuleStore`])
//! - base reward calculation and daily cap enforcement
//! - the storage seam ([`LedgerPort`]) and an in-memory ledger
//! - anti-fraud guards and per-user serialization
//! - the monthly emission rebalance

mod anti_fraud;
mod calculator;
mod cap;
mod clock;
mod config;
mod engine;
mod error;
mod ledger;
mod memory_ledger;
mod rebalance;
mod rule_store;
mod user_locks;
mod util;

#[cfg(test)]
mod tests;

// Config
pub use config::{
    AntiFraudConfig, AutoRebalanceConfig, RewardConfig, RewardRule, RewardRuleConfig,
    SecurityConfig, VersionedConfig, TOTAL_TOKEN_SUPPLY,
};

// Rule store
pub use rule_store::{MemoryRuleStore, RuleStore, TomlRuleStore, DEFAULT_RULES_FILE};

// Error
pub use error::RewardError;

// Calculation
pub use calculator::{calculate_base_reward, BOOK_COMPLETION_THRESHOLD, STEPS_PER_REWARD_UNIT};
pub use cap::{apply_daily_cap, remaining_cap};

// Ledger
pub use ledger::LedgerPort;
pub use memory_ledger::InMemoryLedger;

// Time
pub use clock::{Clock, FixedClock, SystemClock};

// Guards
pub use anti_fraud::{
    check_reward_guards, detect_suspicious_activity, start_of_utc_day, FraudVerdict,
    SuspiciousActivity,
};
pub use user_locks::UserLocks;

// Rebalance
pub use rebalance::{
    compute_rebalance, emission_window_start, RebalanceInputs, COEFFICIENT_DECIMAL_PLACES,
    EMISSION_WINDOW_DAYS, MIN_REBALANCE_COEFFICIENT,
};

// Engine
pub use engine::{EventOutcome, RewardEngine, SkipReason, MAX_BATCH_EVENTS};

// Util
pub use util::{read_json_from_path, write_json_to_path};
