use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mind_rewards_proto::action::{ACTION_PARTNER_SUBSCRIPTION, ACTION_STEPS};
use mind_rewards_proto::{
    CounterDelta, DailyStats, NewRewardRecord, NewTransaction, RebalanceReport, RemainingCaps,
    RewardEvent, TransactionKind,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::anti_fraud::{check_reward_guards, detect_suspicious_activity, FraudVerdict};
use super::calculator::calculate_base_reward;
use super::cap::{apply_daily_cap, remaining_cap};
use super::clock::{Clock, SystemClock};
use super::config::{RewardConfig, VersionedConfig};
use super::error::RewardError;
use super::ledger::LedgerPort;
use super::rebalance::{compute_rebalance, emission_window_start, RebalanceInputs};
use super::rule_store::RuleStore;
use super::user_locks::UserLocks;

/// Largest batch accepted from outside callers.
pub const MAX_BATCH_EVENTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    UnknownAction,
    ZeroReward,
    CapReached,
    Cooldown,
    DailyLimit,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::UnknownAction => "unknown_action",
            SkipReason::ZeroReward => "zero_reward",
            SkipReason::CapReached => "cap_reached",
            SkipReason::Cooldown => "cooldown",
            SkipReason::DailyLimit => "daily_limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Whole MIND written to the balance, the reward record, the transaction
    /// log and the daily counter alike.
    Credited { mind_amount: u64 },
    Skipped(SkipReason),
}

impl EventOutcome {
    pub fn is_credited(&self) -> bool {
        matches!(self, EventOutcome::Credited { .. })
    }
}

/// Turns reward events into ledger writes under an engine-owned config.
pub struct RewardEngine<S: RuleStore> {
    store: S,
    config: RwLock<VersionedConfig>,
    locks: UserLocks,
    clock: Arc<dyn Clock>,
}

impl<S: RuleStore> RewardEngine<S> {
    /// Loads the rule document from `store`. A missing document is fatal.
    pub fn new(store: S) -> Result<Self, RewardError> {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Result<Self, RewardError> {
        let config = store.load()?;
        info!(
            coefficient = %config.rebalance_coefficient,
            rules = config.rewards.len(),
            "reward engine initialized"
        );
        Ok(Self {
            store,
            config: RwLock::new(VersionedConfig::new(config)),
            locks: UserLocks::new(),
            clock,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config_snapshot(&self) -> RewardConfig {
        self.read_config().config.clone()
    }

    pub fn config_version(&self) -> u64 {
        self.read_config().version
    }

    /// Re-reads the rule document and bumps the config version.
    pub fn reload_config(&self) -> Result<u64, RewardError> {
        let config = self.store.load()?;
        let mut current = self.write_config();
        current.replace(config);
        info!(version = current.version, "reward config reloaded");
        Ok(current.version)
    }

    /// Processes `events` in input order. Skips are silent; the first storage
    /// error aborts the batch and is returned unchanged. Committing the
    /// ledger's unit of work is left to the caller.
    pub fn process_batch<L: LedgerPort + ?Sized>(
        &self,
        ledger: &mut L,
        events: &[RewardEvent],
    ) -> Result<(), RewardError> {
        let config = self.config_snapshot();
        let mut credited = 0usize;
        for event in events {
            if self.process_with_config(ledger, &config, event)?.is_credited() {
                credited += 1;
            }
        }
        debug!(events = events.len(), credited, "reward batch processed");
        Ok(())
    }

    /// Processes a single event and reports what happened to it.
    pub fn process_event<L: LedgerPort + ?Sized>(
        &self,
        ledger: &mut L,
        event: &RewardEvent,
    ) -> Result<EventOutcome, RewardError> {
        let config = self.config_snapshot();
        self.process_with_config(ledger, &config, event)
    }

    fn process_with_config<L: LedgerPort + ?Sized>(
        &self,
        ledger: &mut L,
        config: &RewardConfig,
        event: &RewardEvent,
    ) -> Result<EventOutcome, RewardError> {
        let outcome = self.locks.with_user(event.user_id.as_str(), || {
            self.apply_event(ledger, config, event)
        })?;
        if let EventOutcome::Skipped(reason) = outcome {
            debug!(
                user_id = %event.user_id,
                action_id = %event.action_id,
                idempotency_key = %event.idempotency_key,
                reason = reason.as_str(),
                "reward event skipped"
            );
        }
        Ok(outcome)
    }

    fn apply_event<L: LedgerPort + ?Sized>(
        &self,
        ledger: &mut L,
        config: &RewardConfig,
        event: &RewardEvent,
    ) -> Result<EventOutcome, RewardError> {
        let user_id = event.user_id.as_str();
        let action_id = event.action_id.as_str();

        if config.security.idempotency_enabled
            && ledger.reward_exists(event.idempotency_key.as_str())?
        {
            return Ok(EventOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let Some(rule) = config.get_rule(action_id) else {
            return Ok(EventOutcome::Skipped(SkipReason::UnknownAction));
        };

        let base = calculate_base_reward(event, &rule);
        if base <= Decimal::ZERO {
            return Ok(EventOutcome::Skipped(SkipReason::ZeroReward));
        }
        // Balance, record, transaction and counter all take whole MIND.
        let adjusted = (base * config.rebalance_coefficient).trunc();
        if adjusted <= Decimal::ZERO {
            return Ok(EventOutcome::Skipped(SkipReason::ZeroReward));
        }

        let now = self.clock.now();
        let today = now.date_naive();
        let category = event.action().category();
        let counter = ledger.get_daily_counter(user_id, today)?;
        let granted =
            apply_daily_cap(adjusted, rule.daily_cap, counter.accumulated(category)).trunc();
        if granted <= Decimal::ZERO {
            return Ok(EventOutcome::Skipped(SkipReason::CapReached));
        }
        let mind_amount = granted.to_u64().unwrap_or(u64::MAX);
        let amount = Decimal::from(mind_amount);

        let verdict = check_reward_guards(
            &*ledger,
            &config.anti_fraud,
            user_id,
            action_id,
            mind_amount,
            now,
        )?;
        match verdict {
            FraudVerdict::Allow => {}
            FraudVerdict::Cooldown {
                seconds_since_last,
                cooldown_seconds,
            } => {
                warn!(
                    user_id,
                    action_id,
                    seconds_since_last,
                    cooldown_seconds,
                    "reward blocked by action cooldown"
                );
                return Ok(EventOutcome::Skipped(SkipReason::Cooldown));
            }
            FraudVerdict::DailyLimit {
                total_today,
                proposed,
                limit,
            } => {
                warn!(
                    user_id,
                    total_today, proposed, limit, "reward blocked by daily reward limit"
                );
                return Ok(EventOutcome::Skipped(SkipReason::DailyLimit));
            }
        }

        ledger.update_user_tokens(user_id, amount)?;
        ledger.record_reward(NewRewardRecord {
            user_id: user_id.to_string(),
            action_id: action_id.to_string(),
            mind_amount,
            idempotency_key: event.idempotency_key.clone(),
            metadata: event.metadata.clone(),
            timestamp: now,
        })?;
        ledger.create_transaction(NewTransaction {
            user_id: user_id.to_string(),
            kind: TransactionKind::Reward,
            amount,
            description: format!("Reward for {action_id}"),
            metadata: event.metadata.clone(),
        })?;
        let delta = CounterDelta::for_category(category, mind_amount);
        if !delta.is_empty() {
            ledger.increment_daily_counter(user_id, today, delta)?;
        }

        info!(
            user_id,
            action_id,
            mind_amount,
            idempotency_key = %event.idempotency_key,
            "reward credited"
        );

        let suspicious = detect_suspicious_activity(&*ledger, &config.anti_fraud, user_id, now)?;
        if let Some(activity) = suspicious {
            warn!(
                user_id,
                account_age_minutes = activity.account_age_minutes,
                actions_today = activity.actions_today,
                "suspicious reward activity on fresh account"
            );
        }

        Ok(EventOutcome::Credited { mind_amount })
    }

    /// Runs the monthly rebalance and returns the resulting coefficient.
    pub fn execute_monthly_rebalance<L: LedgerPort + ?Sized>(
        &self,
        ledger: &L,
    ) -> Result<Decimal, RewardError> {
        Ok(self
            .execute_monthly_rebalance_report(ledger)?
            .new_coefficient)
    }

    /// Like [`Self::execute_monthly_rebalance`], returning the full report.
    /// The rule document is saved only when the coefficient changes.
    pub fn execute_monthly_rebalance_report<L: LedgerPort + ?Sized>(
        &self,
        ledger: &L,
    ) -> Result<RebalanceReport, RewardError> {
        let now = self.clock.now();
        let config = self.config_snapshot();

        let (actual_emission, total_distributed) = if config.auto_rebalance.enabled {
            (
                ledger.sum_rewards_between(emission_window_start(now), now)?,
                ledger.total_rewards()?,
            )
        } else {
            (0, 0)
        };
        let inputs = RebalanceInputs::from_config(
            &config,
            Decimal::from(actual_emission),
            Decimal::from(total_distributed),
        );
        let report = compute_rebalance(&inputs, now);

        // Ledger reads and the document write happen outside the config lock;
        // the write guard is only held for the swap.
        let version = if report.changed() {
            let mut next = config;
            next.rebalance_coefficient = report.new_coefficient;
            self.store.save(&next)?;
            let mut current = self.write_config();
            current.replace(next);
            current.version
        } else {
            self.config_version()
        };

        info!(
            decision = ?report.decision,
            previous = %report.previous_coefficient,
            coefficient = %report.new_coefficient,
            actual_emission = %report.actual_emission,
            target_emission = ?report.target_emission,
            version,
            "monthly rebalance executed"
        );
        Ok(report)
    }

    /// Today's counters for `user_id` plus the headroom left under the steps
    /// and subscription caps.
    pub fn get_user_daily_stats<L: LedgerPort + ?Sized>(
        &self,
        ledger: &mut L,
        user_id: &str,
    ) -> Result<DailyStats, RewardError> {
        let config = self.config_snapshot();
        let today = self.clock.today();
        let counter = ledger.get_daily_counter(user_id, today)?;
        let headroom = |action_id: &str, used: u64| {
            config
                .get_rule(action_id)
                .and_then(|rule| rule.daily_cap)
                .map(|cap| remaining_cap(cap, used))
        };
        Ok(DailyStats {
            date: today,
            steps_mind: counter.steps_mind,
            books_mind: counter.books_mind,
            courses_mind: counter.courses_mind,
            subs_mind: counter.subs_mind,
            remaining_caps: RemainingCaps {
                steps: headroom(ACTION_STEPS, counter.steps_mind),
                subs: headroom(ACTION_PARTNER_SUBSCRIPTION, counter.subs_mind),
            },
        })
    }

    /// Counters are keyed by date, so a new day starts from zero on its own.
    pub fn reset_daily_counters(&self) {
        debug!(date = %self.clock.today(), "daily counters are date scoped; nothing to reset");
    }

    fn read_config(&self) -> RwLockReadGuard<'_, VersionedConfig> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_config(&self) -> RwLockWriteGuard<'_, VersionedConfig> {
        self.config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
