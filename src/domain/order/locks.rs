use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::value_objects::OrderId;

/// One async mutex per order id, created on demand.
///
/// Every read-modify-write of an existing order runs while holding its
/// guard, so two writers on the same order are serialized. Entries are
/// removed once the last guard for an id is dropped.
#[derive(Clone, Default)]
pub struct OrderLocks {
    locks: Arc<DashMap<OrderId, Arc<Mutex<()>>>>,
}

pub struct OrderGuard {
    order_id: OrderId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<OrderId, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: OrderId) -> OrderGuard {
        let mutex = self
            .locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Exists before the wait so a caller dropped mid-wait still cleans up.
        // The pending lock future owns `mutex` and is dropped before it.
        let mut guard = OrderGuard {
            order_id,
            guard: None,
            locks: self.locks.clone(),
        };
        guard.guard = Some(mutex.lock_owned().await);
        guard
    }

    /// Number of ids with a live lock entry.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for OrderGuard {
    fn drop(&mut self) {
        // Release the mutex first so our own Arc no longer counts.
        self.guard.take();
        // The map holds one reference; anyone else waiting holds another.
        self.locks
            .remove_if(&self.order_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
