// ============================================================================
// Order Store
// ============================================================================
//
// Persistence for whole Order aggregates. `save` is an upsert with
// last-write-wins semantics; it never merges fields.
//
// ============================================================================

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::order::{Order, OrderId, OrderStatus};

pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// `None` both when the order is missing and when it is not in `status`.
    async fn find_by_id_and_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;

    /// Insert or replace the whole aggregate and return what was stored.
    async fn save(&self, order: Order) -> Result<Order, StoreError>;

    async fn find_all(&self) -> Result<Vec<Order>, StoreError>;
}
