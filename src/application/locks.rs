use crate::domain::issue::IssueKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-issue advisory locks.
///
/// Payout attempts on the same issue are serialized; attempts on different
/// issues proceed in parallel.
#[derive(Default, Clone)]
pub struct IssueLocks {
    locks: Arc<Mutex<HashMap<IssueKey, Arc<Mutex<()>>>>>,
}

impl IssueLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. The lock is released when the
    /// returned guard is dropped.
    pub async fn acquire(&self, key: &IssueKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops entries nobody holds or waits on.
    pub async fn prune(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
