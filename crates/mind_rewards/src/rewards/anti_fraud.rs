//! Abuse guards consulted right before a reward is credited.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use super::config::AntiFraudConfig;
use super::error::RewardError;
use super::ledger::LedgerPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudVerdict {
    Allow,
    Cooldown {
        seconds_since_last: i64,
        cooldown_seconds: u64,
    },
    DailyLimit {
        total_today: u64,
        proposed: u64,
        limit: u64,
    },
}

impl FraudVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FraudVerdict::Allow)
    }
}

/// A fresh account with unusually many rewards today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousActivity {
    pub user_id: String,
    pub account_age_minutes: i64,
    pub actions_today: u64,
}

pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// Checks the per-action cooldown, then the per-user daily total.
pub fn check_reward_guards<L: LedgerPort + ?Sized>(
    ledger: &L,
    config: &AntiFraudConfig,
    user_id: &str,
    action_id: &str,
    proposed: u64,
    now: DateTime<Utc>,
) -> Result<FraudVerdict, RewardError> {
    if !config.enabled {
        return Ok(FraudVerdict::Allow);
    }

    if config.action_cooldown_seconds > 0 {
        if let Some(last) = ledger.last_reward_at(user_id, action_id)? {
            let seconds_since_last = (now - last).num_seconds();
            let cooldown = i64::try_from(config.action_cooldown_seconds).unwrap_or(i64::MAX);
            if seconds_since_last < cooldown {
                return Ok(FraudVerdict::Cooldown {
                    seconds_since_last,
                    cooldown_seconds: config.action_cooldown_seconds,
                });
            }
        }
    }

    let today = ledger.reward_activity_since(user_id, start_of_utc_day(now))?;
    if today.total_mind.saturating_add(proposed) > config.daily_reward_limit {
        return Ok(FraudVerdict::DailyLimit {
            total_today: today.total_mind,
            proposed,
            limit: config.daily_reward_limit,
        });
    }

    Ok(FraudVerdict::Allow)
}

/// Reports fresh accounts that already hit the suspicious activity level
/// today. Purely informational.
pub fn detect_suspicious_activity<L: LedgerPort + ?Sized>(
    ledger: &L,
    config: &AntiFraudConfig,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<SuspiciousActivity>, RewardError> {
    if !config.enabled {
        return Ok(None);
    }
    let Some(created_at) = ledger
        .user_account(user_id)?
        .and_then(|account| account.created_at)
    else {
        return Ok(None);
    };
    let account_age_minutes = (now - created_at).num_minutes();
    if account_age_minutes > config.fresh_account_minutes {
        return Ok(None);
    }
    let today = ledger.reward_activity_since(user_id, start_of_utc_day(now))?;
    if today.count < config.suspicious_actions_per_day {
        return Ok(None);
    }
    Ok(Some(SuspiciousActivity {
        user_id: user_id.to_string(),
        account_age_minutes,
        actions_today: today.count,
    }))
}
