//! Ledger rows written by the reward engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::action::CounterCategory;
use crate::event::EventMetadata;

/// Reward row as handed to storage; `id` is assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRewardRecord {
    pub user_id: String,
    pub action_id: String,
    pub mind_amount: u64,
    pub idempotency_key: String,
    pub metadata: Option<EventMetadata>,
    pub timestamp: DateTime<Utc>,
}

/// Immutable reward entry. Unique per `idempotency_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub id: u64,
    pub user_id: String,
    pub action_id: String,
    pub mind_amount: u64,
    pub idempotency_key: String,
    pub metadata: Option<EventMetadata>,
    pub timestamp: DateTime<Utc>,
}

impl RewardRecord {
    pub fn from_new(id: u64, record: NewRewardRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            action_id: record.action_id,
            mind_amount: record.mind_amount,
            idempotency_key: record.idempotency_key,
            metadata: record.metadata,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Reward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub metadata: Option<EventMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: u64,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub metadata: Option<EventMetadata>,
    pub created_at: DateTime<Utc>,
}

/// Per user, per UTC day reward totals. Fields only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub user_id: String,
    pub date: NaiveDate,
    pub steps_mind: u64,
    pub books_mind: u64,
    pub courses_mind: u64,
    pub subs_mind: u64,
}

impl DailyCounter {
    pub fn empty(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            steps_mind: 0,
            books_mind: 0,
            courses_mind: 0,
            subs_mind: 0,
        }
    }

    pub fn get(&self, category: CounterCategory) -> u64 {
        match category {
            CounterCategory::Steps => self.steps_mind,
            CounterCategory::Books => self.books_mind,
            CounterCategory::Courses => self.courses_mind,
            CounterCategory::Subscriptions => self.subs_mind,
        }
    }

    /// Amount already accumulated for an optional category; untracked
    /// actions read as zero.
    pub fn accumulated(&self, category: Option<CounterCategory>) -> u64 {
        category.map(|category| self.get(category)).unwrap_or(0)
    }

    pub fn apply(&mut self, delta: &CounterDelta) {
        self.steps_mind = self.steps_mind.saturating_add(delta.steps);
        self.books_mind = self.books_mind.saturating_add(delta.books);
        self.courses_mind = self.courses_mind.saturating_add(delta.courses);
        self.subs_mind = self.subs_mind.saturating_add(delta.subs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterDelta {
    pub steps: u64,
    pub books: u64,
    pub courses: u64,
    pub subs: u64,
}

impl CounterDelta {
    pub fn for_category(category: Option<CounterCategory>, amount: u64) -> Self {
        let mut delta = CounterDelta::default();
        match category {
            Some(CounterCategory::Steps) => delta.steps = amount,
            Some(CounterCategory::Books) => delta.books = amount,
            Some(CounterCategory::Courses) => delta.courses = amount,
            Some(CounterCategory::Subscriptions) => delta.subs = amount,
            None => {}
        }
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0 && self.books == 0 && self.courses == 0 && self.subs == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,
    pub token_balance: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token_balance: Decimal::ZERO,
            created_at: None,
        }
    }
}

/// Aggregate over a user's reward rows in some window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardActivity {
    pub total_mind: u64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{CounterDelta, DailyCounter};
    use crate::action::CounterCategory;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[test]
    fn counter_delta_targets_single_field() {
        let delta = CounterDelta::for_category(Some(CounterCategory::Courses), 40);
        assert_eq!(delta.courses, 40);
        assert_eq!(delta.steps + delta.books + delta.subs, 0);
        assert!(CounterDelta::for_category(None, 40).is_empty());
    }

    #[test]
    fn counter_apply_accumulates() {
        let mut counter = DailyCounter::empty("u-1", day());
        counter.apply(&CounterDelta::for_category(Some(CounterCategory::Steps), 3));
        counter.apply(&CounterDelta::for_category(Some(CounterCategory::Steps), 4));
        assert_eq!(counter.get(CounterCategory::Steps), 7);
        assert_eq!(counter.accumulated(None), 0);
    }
}
