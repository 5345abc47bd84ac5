use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::RewardError;

/// Fixed MIND budget set aside for user rewards.
pub const TOTAL_TOKEN_SUPPLY: Decimal = dec!(2000000000);

const DEFAULT_REBALANCE_COEFFICIENT: Decimal = dec!(1);
const DEFAULT_REMAINING_POOL_MONTHS: i64 = 24;
const DEFAULT_ACTION_COOLDOWN_SECONDS: u64 = 30;
const DEFAULT_DAILY_REWARD_LIMIT: u64 = 1_000;
const DEFAULT_FRESH_ACCOUNT_MINUTES: i64 = 60;
const DEFAULT_SUSPICIOUS_ACTIONS_PER_DAY: u64 = 100;

/// A resolved reward rule for one action id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRule {
    pub action_id: String,
    pub base_reward: Decimal,
    pub daily_cap: Option<Decimal>,
}

/// Raw `[rewards.<action_id>]` table as written in the config document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardRuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_reward: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_cap: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RewardRuleConfig {
    pub fn new(base_reward: Decimal, daily_cap: Option<Decimal>) -> Self {
        Self {
            action_id: None,
            base_reward: Some(base_reward),
            daily_cap,
            notes: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.action_id.is_none()
            && self.base_reward.is_none()
            && self.daily_cap.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRebalanceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_remaining_pool_months")]
    pub remaining_pool_months: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl Default for AutoRebalanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            remaining_pool_months: DEFAULT_REMAINING_POOL_MONTHS,
            schedule: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_true")]
    pub idempotency_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            idempotency_enabled: true,
        }
    }
}

/// Abuse guards applied after cap enforcement. Off unless the document
/// carries an `[anti_fraud]` section with `enabled = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiFraudConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_action_cooldown_seconds")]
    pub action_cooldown_seconds: u64,
    #[serde(default = "default_daily_reward_limit")]
    pub daily_reward_limit: u64,
    #[serde(default = "default_fresh_account_minutes")]
    pub fresh_account_minutes: i64,
    #[serde(default = "default_suspicious_actions_per_day")]
    pub suspicious_actions_per_day: u64,
}

impl Default for AntiFraudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            action_cooldown_seconds: DEFAULT_ACTION_COOLDOWN_SECONDS,
            daily_reward_limit: DEFAULT_DAILY_REWARD_LIMIT,
            fresh_account_minutes: DEFAULT_FRESH_ACCOUNT_MINUTES,
            suspicious_actions_per_day: DEFAULT_SUSPICIOUS_ACTIONS_PER_DAY,
        }
    }
}

/// The whole reward rule document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_rebalance_coefficient")]
    pub rebalance_coefficient: Decimal,
    #[serde(default)]
    pub auto_rebalance: AutoRebalanceConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub anti_fraud: AntiFraudConfig,
    #[serde(default)]
    pub rewards: BTreeMap<String, RewardRuleConfig>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            rebalance_coefficient: DEFAULT_REBALANCE_COEFFICIENT,
            auto_rebalance: AutoRebalanceConfig::default(),
            security: SecurityConfig::default(),
            anti_fraud: AntiFraudConfig::default(),
            rewards: BTreeMap::new(),
        }
    }
}

impl RewardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, RewardError> {
        let config: RewardConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_rule(mut self, action_id: impl Into<String>, rule: RewardRuleConfig) -> Self {
        self.rewards.insert(action_id.into(), rule);
        self
    }

    /// Rule for `action_id`, or `None` when the action grants nothing.
    pub fn get_rule(&self, action_id: &str) -> Option<RewardRule> {
        let raw = self.rewards.get(action_id)?;
        if raw.is_empty() {
            return None;
        }
        Some(RewardRule {
            action_id: raw
                .action_id
                .clone()
                .unwrap_or_else(|| action_id.to_string()),
            base_reward: raw.base_reward.unwrap_or(Decimal::ZERO),
            daily_cap: raw.daily_cap,
        })
    }

    pub fn validate(&self) -> Result<(), RewardError> {
        if self.rebalance_coefficient <= Decimal::ZERO {
            return Err(RewardError::ConfigInvalid {
                reason: format!(
                    "rebalance_coefficient must be positive, got {}",
                    self.rebalance_coefficient
                ),
            });
        }
        for (action_id, rule) in &self.rewards {
            if rule.base_reward.is_some_and(|value| value < Decimal::ZERO) {
                return Err(RewardError::ConfigInvalid {
                    reason: format!("rewards.{action_id}.base_reward cannot be negative"),
                });
            }
            if rule.daily_cap.is_some_and(|value| value < Decimal::ZERO) {
                return Err(RewardError::ConfigInvalid {
                    reason: format!("rewards.{action_id}.daily_cap cannot be negative"),
                });
            }
        }
        Ok(())
    }
}

/// Engine-owned config value. `version` starts at 1 and moves on every
/// rebalance change or reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedConfig {
    pub version: u64,
    pub config: RewardConfig,
}

impl VersionedConfig {
    pub fn new(config: RewardConfig) -> Self {
        Self { version: 1, config }
    }

    pub fn replace(&mut self, config: RewardConfig) {
        self.config = config;
        self.version = self.version.saturating_add(1);
    }
}

fn default_true() -> bool {
    true
}

fn default_rebalance_coefficient() -> Decimal {
    DEFAULT_REBALANCE_COEFFICIENT
}

fn default_remaining_pool_months() -> i64 {
    DEFAULT_REMAINING_POOL_MONTHS
}

fn default_action_cooldown_seconds() -> u64 {
    DEFAULT_ACTION_COOLDOWN_SECONDS
}

fn default_daily_reward_limit() -> u64 {
    DEFAULT_DAILY_REWARD_LIMIT
}

fn default_fresh_account_minutes() -> i64 {
    DEFAULT_FRESH_ACCOUNT_MINUTES
}

fn default_suspicious_actions_per_day() -> u64 {
    DEFAULT_SUSPICIOUS_ACTIONS_PER_DAY
}
