use super::value_objects::{AddressId, OrderId, OrderStatus};
use crate::inventory::InventoryFailure;
use crate::store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidOrder(String),

    /// Raised both for a missing order and for one sitting in another status.
    /// `cause` tells them apart for logs and metrics only.
    #[error("Order not found with id: {order_id}")]
    OrderNotFound { order_id: OrderId, cause: NotFoundCause },

    /// `(from, to)` is not one of the forward steps of the lifecycle.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("No address found with ID: {address_id}")]
    AddressNotFound { address_id: AddressId },

    #[error("Order validation failed: {0}")]
    ValidationFailed(InventoryFailure),

    #[error("An error occurred while trying to return inventory: {0}")]
    InventoryReturnFailure(InventoryFailure),

    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn invalid(message: impl Into<String>) -> Self {
        OrderError::InvalidOrder(message.into())
    }

    /// True when the inventory service could not be reached at all. Callers
    /// may retry these out of band.
    pub fn is_unavailable(&self) -> bool {
        match self {
            OrderError::ValidationFailed(failure) | OrderError::InventoryReturnFailure(failure) => {
                failure.is_unavailable()
            }
            _ => false,
        }
    }
}

/// Diagnostic detail behind an `OrderNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCause {
    Absent,
    StatusMismatch {
        expected: OrderStatus,
        actual: OrderStatus,
    },
}

impl NotFoundCause {
    pub fn label(&self) -> &'static str {
        match self {
            NotFoundCause::Absent => "absent",
            NotFoundCause::StatusMismatch { .. } => "status_mismatch",
        }
    }
}
