pub mod rewards;

pub use rewards::{
    apply_daily_cap, calculate_base_reward, compute_rebalance, AntiFraudConfig,
    AutoRebalanceConfig, Clock, EventOutcome, FixedClock, InMemoryLedger, LedgerPort,
    MemoryRuleStore, RebalanceInputs, RewardConfig, RewardEngine, RewardError, RewardRule,
    RewardRuleConfig, RuleStore, SecurityConfig, SkipReason, SystemClock, TomlRuleStore,
    UserLocks, VersionedConfig, DEFAULT_RULES_FILE, MAX_BATCH_EVENTS, TOTAL_TOKEN_SUPPLY,
};

pub use mind_rewards_proto as proto;
