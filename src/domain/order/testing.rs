//! Test doubles for the lifecycle's collaborators.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Order, OrderId, OrderStatus};
use crate::inventory::{InventoryFailure, InventoryGateway, StockLine, StockOperation};
use crate::store::{InMemoryOrderStore, OrderStore, StoreError};

/// Inventory gateway that succeeds unless told otherwise and records every call.
#[derive(Default)]
pub struct FakeInventory {
    reserve_failure: Mutex<Option<InventoryFailure>>,
    release_failure: Mutex<Option<InventoryFailure>>,
    calls: Mutex<Vec<(StockOperation, Vec<StockLine>)>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reserve(&self, failure: InventoryFailure) {
        *self.reserve_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_release(&self, failure: InventoryFailure) {
        *self.release_failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> Vec<(StockOperation, Vec<StockLine>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        operation: StockOperation,
        batch: &[StockLine],
        failure: &Mutex<Option<InventoryFailure>>,
    ) -> Result<(), InventoryFailure> {
        self.calls.lock().unwrap().push((operation, batch.to_vec()));
        match failure.lock().unwrap().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InventoryGateway for FakeInventory {
    async fn reserve(&self, batch: &[StockLine]) -> Result<(), InventoryFailure> {
        self.record(StockOperation::Reserve, batch, &self.reserve_failure)
    }

    async fn release(&self, batch: &[StockLine]) -> Result<(), InventoryFailure> {
        self.record(StockOperation::Release, batch, &self.release_failure)
    }
}

/// In-memory store that counts saves and can be made slow or failing.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryOrderStore,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_save_delay_ms(&self, delay_ms: u64) {
        self.save_delay_ms.store(delay_ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for RecordingStore {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_id_and_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        self.inner.find_by_id_and_status(id, status).await
    }

    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(order).await
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        self.inner.find_all().await
    }
}
