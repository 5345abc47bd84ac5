//! Storage seam consumed by the reward engine.
//!
//! An implementation represents one unit of work (one storage session). The
//! engine issues every write for a batch through the same `&mut` port and the
//! caller commits afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use mind_rewards_proto::{
    CounterDelta, DailyCounter, NewRewardRecord, NewTransaction, RewardActivity, RewardRecord,
    TransactionRecord, UserAccount,
};
use rust_decimal::Decimal;

use super::error::RewardError;

pub trait LedgerPort {
    fn reward_exists(&self, idempotency_key: &str) -> Result<bool, RewardError>;

    /// Adds `delta` to the user's token balance. Fails with `UserNotFound` for
    /// unknown users.
    fn update_user_tokens(&mut self, user_id: &str, delta: Decimal) -> Result<(), RewardError>;

    /// Appends a reward row. Must fail with `DuplicateIdempotencyKey` if the
    /// key is already present.
    fn record_reward(&mut self, record: NewRewardRecord) -> Result<RewardRecord, RewardError>;

    fn create_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionRecord, RewardError>;

    /// Counter row for `(user_id, date)`, created zeroed on first access.
    fn get_daily_counter(
        &mut self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<DailyCounter, RewardError>;

    fn increment_daily_counter(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        delta: CounterDelta,
    ) -> Result<DailyCounter, RewardError>;

    /// Sum of `mind_amount` for rewards with `from <= timestamp <= to`.
    fn sum_rewards_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RewardError>;

    /// Sum of `mind_amount` over every reward ever recorded.
    fn total_rewards(&self) -> Result<u64, RewardError>;

    fn last_reward_at(
        &self,
        user_id: &str,
        action_id: &str,
    ) -> Result<Option<DateTime<Utc>>, RewardError>;

    fn reward_activity_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<RewardActivity, RewardError>;

    fn user_account(&self, user_id: &str) -> Result<Option<UserAccount>, RewardError>;
}
