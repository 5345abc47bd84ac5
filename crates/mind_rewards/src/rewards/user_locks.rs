use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One mutex per user id, created on first use. Holding a user's guard
/// serializes balance and counter updates for that user across every caller
/// sharing the same engine.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `work` while holding the lock for `user_id`.
    pub fn with_user<T>(&self, user_id: &str, work: impl FnOnce() -> T) -> T {
        let lock = self.handle(user_id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        work()
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
