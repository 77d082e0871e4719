use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::params::CacheKey;

#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Requests holding or waiting on `lock`.
    users: usize,
}

type Slots = Arc<Mutex<HashMap<CacheKey, Slot>>>;

/// Per-key async locks collapsing concurrent generations of the same artifact.
#[derive(Debug, Clone, Default)]
pub struct InflightLocks {
    slots: Slots,
}

/// One request registered on a key's slot. Unregisters on drop, whether the
/// request finished or was cancelled while still waiting.
#[derive(Debug)]
struct SlotUser {
    key: CacheKey,
    slots: Slots,
}

impl Drop for SlotUser {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Held while one request generates the artifact for a key.
/// Dropping it wakes the next waiter and forgets the slot once unused.
#[derive(Debug)]
pub struct InflightLease {
    // drops before `_user`: a slot is only forgotten once its lock is free
    _guard: OwnedMutexGuard<()>,
    _user: SlotUser,
}

impl InflightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &CacheKey) -> InflightLease {
        let (lock, user) = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.clone()).or_default();
            slot.users += 1;
            let user = SlotUser {
                key: key.clone(),
                slots: self.slots.clone(),
            };
            (slot.lock.clone(), user)
        };

        let guard = lock.lock_owned().await;

        InflightLease {
            _guard: guard,
            _user: user,
        }
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
