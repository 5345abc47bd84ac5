use serde::{Deserialize, Serialize};

use crate::action::ActionKind;

pub type EventMetadata = serde_json::Map<String, serde_json::Value>;

/// A user action submitted for reward processing.
///
/// `idempotency_key` is globally unique; the engine grants at most one reward
/// per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub user_id: String,
    pub action_id: String,
    #[serde(default)]
    pub value: Option<f64>,
    pub idempotency_key: String,
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
}

impl RewardEvent {
    pub fn new(
        user_id: impl Into<String>,
        action_id: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action_id: action_id.into(),
            value: None,
            idempotency_key: idempotency_key.into(),
            metadata: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn action(&self) -> ActionKind {
        ActionKind::parse(self.action_id.as_str())
    }
}
