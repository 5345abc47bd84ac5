//! Durable storage for the reward rule document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use toml::{Table, Value};

use super::config::{AntiFraudConfig, RewardConfig, RewardRuleConfig};
use super::error::RewardError;
use super::util::write_bytes_atomic;

pub const DEFAULT_RULES_FILE: &str = "rewards.toml";

/// Loads and persists the reward configuration.
pub trait RuleStore {
    fn load(&self) -> Result<RewardConfig, RewardError>;
    fn save(&self, config: &RewardConfig) -> Result<(), RewardError>;
}

/// TOML file backed rule store.
///
/// `save` merges the typed values into the document that is currently on
/// disk, so comments aside, hand-written key order and keys this crate does
/// not model survive a rewrite.
#[derive(Debug, Clone)]
pub struct TomlRuleStore {
    path: PathBuf,
}

impl TomlRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn read_document(&self) -> Result<Table, RewardError> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(raw.parse::<Table>()?)
    }
}

impl RuleStore for TomlRuleStore {
    fn load(&self) -> Result<RewardConfig, RewardError> {
        if !self.path.exists() {
            return Err(RewardError::ConfigMissing {
                path: self.path.clone(),
            });
        }
        let raw = fs::read_to_string(&self.path)?;
        RewardConfig::from_toml_str(raw.as_str())
    }

    fn save(&self, config: &RewardConfig) -> Result<(), RewardError> {
        config.validate()?;
        let mut document = self.read_document()?;
        merge_config_into(&mut document, config);
        let rendered = toml::to_string(&document)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        write_bytes_atomic(&self.path, rendered.as_bytes())
    }
}

/// In-memory rule store for fixtures. Counts successful saves.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    config: Mutex<Option<RewardConfig>>,
    saves: AtomicUsize,
}

impl MemoryRuleStore {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<RewardConfig> {
        self.lock().clone()
    }

    pub fn replace(&self, config: RewardConfig) {
        *self.lock() = Some(config);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RewardConfig>> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RuleStore for MemoryRuleStore {
    fn load(&self) -> Result<RewardConfig, RewardError> {
        let config = self.lock().clone().ok_or_else(|| RewardError::ConfigMissing {
            path: PathBuf::from("<memory>"),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn save(&self, config: &RewardConfig) -> Result<(), RewardError> {
        config.validate()?;
        *self.lock() = Some(config.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn merge_config_into(document: &mut Table, config: &RewardConfig) {
    document.insert(
        "rebalance_coefficient".to_string(),
        decimal_value(config.rebalance_coefficient),
    );

    let auto_rebalance = child_table(document, "auto_rebalance");
    auto_rebalance.insert(
        "enabled".to_string(),
        Value::Boolean(config.auto_rebalance.enabled),
    );
    auto_rebalance.insert(
        "remaining_pool_months".to_string(),
        Value::Integer(config.auto_rebalance.remaining_pool_months),
    );
    set_optional(
        auto_rebalance,
        "schedule",
        config.auto_rebalance.schedule.clone().map(Value::String),
    );

    let security = child_table(document, "security");
    security.insert(
        "idempotency_enabled".to_string(),
        Value::Boolean(config.security.idempotency_enabled),
    );

    if document.contains_key("anti_fraud") || config.anti_fraud != AntiFraudConfig::default() {
        merge_anti_fraud(child_table(document, "anti_fraud"), &config.anti_fraud);
    }

    let rewards = child_table(document, "rewards");
    let stale = rewards
        .keys()
        .filter(|action_id| !config.rewards.contains_key(action_id.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    for action_id in stale {
        rewards.remove(action_id.as_str());
    }
    for (action_id, rule) in &config.rewards {
        merge_rule(child_table(rewards, action_id), rule);
    }
}

fn merge_anti_fraud(table: &mut Table, anti_fraud: &AntiFraudConfig) {
    table.insert("enabled".to_string(), Value::Boolean(anti_fraud.enabled));
    table.insert(
        "action_cooldown_seconds".to_string(),
        saturating_integer(anti_fraud.action_cooldown_seconds),
    );
    table.insert(
        "daily_reward_limit".to_string(),
        saturating_integer(anti_fraud.daily_reward_limit),
    );
    table.insert(
        "fresh_account_minutes".to_string(),
        Value::Integer(anti_fraud.fresh_account_minutes),
    );
    table.insert(
        "suspicious_actions_per_day".to_string(),
        saturating_integer(anti_fraud.suspicious_actions_per_day),
    );
}

fn merge_rule(table: &mut Table, rule: &RewardRuleConfig) {
    set_optional(table, "action_id", rule.action_id.clone().map(Value::String));
    set_optional(table, "base_reward", rule.base_reward.map(decimal_value));
    set_optional(table, "daily_cap", rule.daily_cap.map(decimal_value));
    set_optional(table, "notes", rule.notes.clone().map(Value::String));
}

fn child_table<'a>(parent: &'a mut Table, key: &str) -> &'a mut Table {
    let slot = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    if !slot.is_table() {
        *slot = Value::Table(Table::new());
    }
    match slot {
        Value::Table(table) => table,
        _ => unreachable!("slot was just replaced with a table"),
    }
}

fn set_optional(table: &mut Table, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            table.insert(key.to_string(), value);
        }
        None => {
            table.remove(key);
        }
    }
}

fn decimal_value(value: Decimal) -> Value {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        if let Some(integer) = normalized.to_i64() {
            return Value::Integer(integer);
        }
    }
    Value::Float(normalized.to_f64().unwrap_or_default())
}

fn saturating_integer(value: u64) -> Value {
    Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}
