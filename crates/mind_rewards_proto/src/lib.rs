//! Shared data types for the MIND reward engine.
//!
//! Everything here is plain serde data: the engine crate, storage adapters and
//! operator tooling all speak these types.

pub mod action;
pub mod event;
pub mod ledger;
pub mod rebalance;
pub mod stats;

pub use action::{ActionKind, CounterCategory, CourseLevel};
pub use event::{EventMetadata, RewardEvent};
pub use ledger::{
    CounterDelta, DailyCounter, NewRewardRecord, NewTransaction, RewardActivity, RewardRecord,
    TransactionKind, TransactionRecord, UserAccount,
};
pub use rebalance::{RebalanceDecision, RebalanceReport};
pub use stats::{DailyStats, RemainingCaps};
