//! Reference `LedgerPort` implementation kept fully in memory, with optional
//! JSON file persistence for the operator binary.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mind_rewards_proto::{
    CounterDelta, DailyCounter, NewRewardRecord, NewTransaction, RewardActivity, RewardRecord,
    TransactionRecord, UserAccount,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::error::RewardError;
use super::ledger::LedgerPort;
use super::util::{read_json_from_path, write_json_atomic};

const LEDGER_FILE_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LedgerFile {
    version: u64,
    accounts: Vec<UserAccount>,
    rewards: Vec<RewardRecord>,
    transactions: Vec<TransactionRecord>,
    daily_counters: Vec<DailyCounter>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct LedgerState {
    accounts: BTreeMap<String, UserAccount>,
    rewards: Vec<RewardRecord>,
    reward_keys: BTreeSet<String>,
    transactions: Vec<TransactionRecord>,
    daily_counters: BTreeMap<(String, NaiveDate), DailyCounter>,
}

impl LedgerState {
    fn from_file(file: LedgerFile) -> Result<Self, RewardError> {
        let mut state = LedgerState::default();
        for account in file.accounts {
            state.accounts.insert(account.user_id.clone(), account);
        }
        for record in file.rewards {
            if !state.reward_keys.insert(record.idempotency_key.clone()) {
                return Err(RewardError::DuplicateIdempotencyKey {
                    key: record.idempotency_key,
                });
            }
            state.rewards.push(record);
        }
        state.transactions = file.transactions;
        for counter in file.daily_counters {
            state
                .daily_counters
                .insert((counter.user_id.clone(), counter.date), counter);
        }
        Ok(state)
    }

    fn to_file(&self) -> LedgerFile {
        LedgerFile {
            version: LEDGER_FILE_VERSION,
            accounts: self.accounts.values().cloned().collect(),
            rewards: self.rewards.clone(),
            transactions: self.transactions.clone(),
            daily_counters: self.daily_counters.values().cloned().collect(),
        }
    }
}

/// In-memory ledger. Cloning the state is the transaction mechanism: see
/// [`InMemoryLedger::unit_of_work`].
#[derive(Clone)]
pub struct InMemoryLedger {
    state: LedgerState,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("accounts", &self.state.accounts.len())
            .field("rewards", &self.state.rewards.len())
            .field("transactions", &self.state.transactions.len())
            .field("daily_counters", &self.state.daily_counters.len())
            .finish()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: LedgerState::default(),
            clock,
        }
    }

    pub fn load_json(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, RewardError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::with_clock(clock));
        }
        let file: LedgerFile = read_json_from_path(path)?;
        if file.version != LEDGER_FILE_VERSION {
            return Err(RewardError::Storage {
                reason: format!(
                    "ledger file version mismatch: expected {LEDGER_FILE_VERSION}, found {}",
                    file.version
                ),
            });
        }
        Ok(Self {
            state: LedgerState::from_file(file)?,
            clock,
        })
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), RewardError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        write_json_atomic(&self.state.to_file(), path)
    }

    /// Runs `work` as one transaction: when it fails, every write it made is
    /// discarded.
    pub fn unit_of_work<T>(
        &mut self,
        work: impl FnOnce(&mut Self) -> Result<T, RewardError>,
    ) -> Result<T, RewardError> {
        let checkpoint = self.state.clone();
        match work(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = checkpoint;
                Err(err)
            }
        }
    }

    /// Registers a user with a zero balance. Existing accounts are kept.
    pub fn register_user(&mut self, user_id: &str) -> UserAccount {
        let created_at = self.clock.now();
        self.state
            .accounts
            .entry(user_id.to_string())
            .or_insert_with(|| UserAccount {
                user_id: user_id.to_string(),
                token_balance: Decimal::ZERO,
                created_at: Some(created_at),
            })
            .clone()
    }

    pub fn insert_account(&mut self, account: UserAccount) {
        self.state
            .accounts
            .insert(account.user_id.clone(), account);
    }

    pub fn balance(&self, user_id: &str) -> Option<Decimal> {
        self.state
            .accounts
            .get(user_id)
            .map(|account| account.token_balance)
    }

    pub fn rewards(&self) -> &[RewardRecord] {
        self.state.rewards.as_slice()
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        self.state.transactions.as_slice()
    }

    pub fn daily_counter(&self, user_id: &str, date: NaiveDate) -> Option<&DailyCounter> {
        self.state
            .daily_counters
            .get(&(user_id.to_string(), date))
    }

    /// Inserts a reward row as-is, bypassing the engine. Used to import
    /// history and to seed emission figures.
    pub fn import_reward(&mut self, record: NewRewardRecord) -> Result<RewardRecord, RewardError> {
        self.record_reward(record)
    }
}

impl LedgerPort for InMemoryLedger {
    fn reward_exists(&self, idempotency_key: &str) -> Result<bool, RewardError> {
        Ok(self.state.reward_keys.contains(idempotency_key))
    }

    fn update_user_tokens(&mut self, user_id: &str, delta: Decimal) -> Result<(), RewardError> {
        let account =
            self.state
                .accounts
                .get_mut(user_id)
                .ok_or_else(|| RewardError::UserNotFound {
                    user_id: user_id.to_string(),
                })?;
        account.token_balance += delta;
        Ok(())
    }

    fn record_reward(&mut self, record: NewRewardRecord) -> Result<RewardRecord, RewardError> {
        if !self
            .state
            .reward_keys
            .insert(record.idempotency_key.clone())
        {
            return Err(RewardError::DuplicateIdempotencyKey {
                key: record.idempotency_key,
            });
        }
        let id = self.state.rewards.len() as u64 + 1;
        let stored = RewardRecord::from_new(id, record);
        self.state.rewards.push(stored.clone());
        Ok(stored)
    }

    fn create_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionRecord, RewardError> {
        let stored = TransactionRecord {
            id: self.state.transactions.len() as u64 + 1,
            user_id: transaction.user_id,
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description,
            metadata: transaction.metadata,
            created_at: self.clock.now(),
        };
        self.state.transactions.push(stored.clone());
        Ok(stored)
    }

    fn get_daily_counter(
        &mut self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<DailyCounter, RewardError> {
        Ok(self
            .state
            .daily_counters
            .entry((user_id.to_string(), date))
            .or_insert_with(|| DailyCounter::empty(user_id, date))
            .clone())
    }

    fn increment_daily_counter(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        delta: CounterDelta,
    ) -> Result<DailyCounter, RewardError> {
        let counter = self
            .state
            .daily_counters
            .entry((user_id.to_string(), date))
            .or_insert_with(|| DailyCounter::empty(user_id, date));
        counter.apply(&delta);
        Ok(counter.clone())
    }

    fn sum_rewards_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RewardError> {
        Ok(self
            .state
            .rewards
            .iter()
            .filter(|record| record.timestamp >= from && record.timestamp <= to)
            .fold(0u64, |sum, record| sum.saturating_add(record.mind_amount)))
    }

    fn total_rewards(&self) -> Result<u64, RewardError> {
        Ok(self
            .state
            .rewards
            .iter()
            .fold(0u64, |sum, record| sum.saturating_add(record.mind_amount)))
    }

    fn last_reward_at(
        &self,
        user_id: &str,
        action_id: &str,
    ) -> Result<Option<DateTime<Utc>>, RewardError> {
        Ok(self
            .state
            .rewards
            .iter()
            .filter(|record| record.user_id == user_id && record.action_id == action_id)
            .map(|record| record.timestamp)
            .max())
    }

    fn reward_activity_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<RewardActivity, RewardError> {
        Ok(self
            .state
            .rewards
            .iter()
            .filter(|record| record.user_id == user_id && record.timestamp >= since)
            .fold(RewardActivity::default(), |activity, record| RewardActivity {
                total_mind: activity.total_mind.saturating_add(record.mind_amount),
                count: activity.count.saturating_add(1),
            }))
    }

    fn user_account(&self, user_id: &str) -> Result<Option<UserAccount>, RewardError> {
        Ok(self.state.accounts.get(user_id).cloned())
    }
}
