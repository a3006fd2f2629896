// ============================================================================
// Inventory Gateway
// ============================================================================
//
// Client side of the remote stock service. A call covers a whole batch and
// either succeeds or fails; the remote side owns atomicity. No retries.
//
// ============================================================================

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderItem, ProductId};
use crate::utils::CircuitState;

pub use http::HttpInventoryGateway;

pub const RESERVE_PATH: &str = "/api/stock/validate-and-deduct-product";
pub const RELEASE_PATH: &str = "/api/stock/add-returned-inventory";

/// One `(productId, quantity)` entry of a reserve or release batch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl StockLine {
    pub fn batch(items: &[OrderItem]) -> Vec<StockLine> {
        items
            .iter()
            .map(|item| StockLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOperation {
    Reserve,
    Release,
}

impl StockOperation {
    pub fn path(self) -> &'static str {
        match self {
            StockOperation::Reserve => RESERVE_PATH,
            StockOperation::Release => RELEASE_PATH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockOperation::Reserve => "reserve",
            StockOperation::Release => "release",
        }
    }
}

/// Why an inventory call did not succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryFailure {
    /// The service answered with a non-success status.
    #[error("inventory service rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Transport failure, timeout, or an open circuit.
    #[error("inventory service unavailable: {0}")]
    Unavailable(String),
}

impl InventoryFailure {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, InventoryFailure::Unavailable(_))
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            InventoryFailure::Rejected { .. } => "rejected",
            InventoryFailure::Unavailable(_) => "unavailable",
        }
    }
}

#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Deduct stock for every line of `batch`.
    async fn reserve(&self, batch: &[StockLine]) -> Result<(), InventoryFailure>;

    /// Return previously deducted stock for every line of `batch`.
    async fn release(&self, batch: &[StockLine]) -> Result<(), InventoryFailure>;

    /// Breaker state for gateways that keep one.
    fn circuit_state(&self) -> Option<CircuitState> {
        None
    }

    async fn execute(
        &self,
        operation: StockOperation,
        batch: &[StockLine],
    ) -> Result<(), InventoryFailure> {
        match operation {
            StockOperation::Reserve => self.reserve(batch).await,
            StockOperation::Release => self.release(batch).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_line_wire_format() {
        let batch = StockLine::batch(&[
            OrderItem { product_id: 101, quantity: 2 },
            OrderItem { product_id: 102, quantity: 1 },
        ]);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"productId": 101, "quantity": 2},
                {"productId": 102, "quantity": 1}
            ])
        );
    }

    #[test]
    fn test_operation_paths() {
        assert_eq!(StockOperation::Reserve.path(), "/api/stock/validate-and-deduct-product");
        assert_eq!(StockOperation::Release.path(), "/api/stock/add-returned-inventory");
    }
}
