//! Error types for the rewards module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the reward engine and its storage seams.
///
/// Skipped events (unknown action, duplicate key, zero reward) are not
/// errors; only configuration and storage failures end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("reward configuration not found at {path:?}")]
    ConfigMissing { path: PathBuf },
    #[error("invalid reward configuration: {reason}")]
    ConfigInvalid { reason: String },
    #[error("reward with idempotency key {key} already recorded")]
    DuplicateIdempotencyKey { key: String },
    #[error("user {user_id} not found")]
    UserNotFound { user_id: String },
    #[error("ledger storage failure: {reason}")]
    Storage { reason: String },
    #[error("io error: {0}")]
    Io(String),
    #[error("toml error: {0}")]
    Toml(String),
    #[error("serde error: {0}")]
    Serde(String),
}

impl From<io::Error> for RewardError {
    fn from(error: io::Error) -> Self {
        RewardError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for RewardError {
    fn from(error: serde_json::Error) -> Self {
        RewardError::Serde(error.to_string())
    }
}

impl From<toml::de::Error> for RewardError {
    fn from(error: toml::de::Error) -> Self {
        RewardError::Toml(error.to_string())
    }
}

impl From<toml::ser::Error> for RewardError {
    fn from(error: toml::ser::Error) -> Self {
        RewardError::Toml(error.to_string())
    }
}
