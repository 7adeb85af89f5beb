//! Per-list serialization
//!
//! Every mutating list operation holds its list's lock for the whole
//! read-modify-write sequence, so two requests against the same list run one
//! after the other. Different lists proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ListLocks {
    locks: Mutex<HashMap<u32, Arc<AsyncMutex<()>>>>,
}

impl ListLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `list_id`
    pub async fn acquire(&self, list_id: u32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(list_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted list
    pub fn forget(&self, list_id: u32) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.remove(&list_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_list_is_serialized() {
        let locks = Arc::new(ListLocks::new());
        let guard = locks.acquire(1).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_lists_are_independent() {
        let locks = ListLocks::new();
        let _one = locks.acquire(1).await;
        let two = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(two.is_ok());
    }
}
