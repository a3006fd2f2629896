use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{NotFoundCause, OrderError};
use super::value_objects::{
    AddressFields, AddressId, CustomerId, DeliveryAddress, OrderId, OrderItem, OrderStatus,
};
use crate::inventory::StockLine;

// ============================================================================
// Order Aggregate
// ============================================================================
//
// Owns its line items and delivery addresses by value. Items are fixed at
// placement; status only moves through `transition` and `cancel`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: OrderId,
    pub customer_id: CustomerId,

    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub status: OrderStatus,

    // Audit
    pub created_at: DateTime<Utc>,

    pub cancellation_reason: Option<String>,
    pub delivery_addresses: Vec<DeliveryAddress>,
}

impl Order {
    /// A freshly placed order. Callers must have validated `items` already.
    ///
    /// `created_at` is kept at microsecond precision so it survives a
    /// round trip through a `TIMESTAMPTZ` column unchanged.
    pub fn place(customer_id: CustomerId, total_price: Decimal, items: Vec<OrderItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            items,
            total_price,
            status: OrderStatus::OrderPlaced,
            created_at: Utc::now().trunc_subsecs(6),
            cancellation_reason: None,
            delivery_addresses: Vec::new(),
        }
    }

    /// Move from `expected` to `next`. Only the forward steps of the
    /// lifecycle are legal pairs.
    pub fn transition(
        &mut self,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), OrderError> {
        ensure_forward_step(expected, next)?;

        if self.status != expected {
            return Err(OrderError::OrderNotFound {
                order_id: self.id,
                cause: NotFoundCause::StatusMismatch {
                    expected,
                    actual: self.status,
                },
            });
        }

        self.status = next;
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
    }

    pub fn add_delivery_address(&mut self, fields: AddressFields) -> AddressId {
        let id = Uuid::new_v4();
        self.delivery_addresses.push(DeliveryAddress {
            id,
            order_id: self.id,
            fields,
        });
        id
    }

    /// Overwrite the first address with `address_id`.
    pub fn update_delivery_address(
        &mut self,
        address_id: AddressId,
        fields: AddressFields,
    ) -> Result<(), OrderError> {
        let address = self
            .delivery_addresses
            .iter_mut()
            .find(|address| address.id == address_id)
            .ok_or(OrderError::AddressNotFound { address_id })?;

        address.fields = fields;
        Ok(())
    }

    /// The inventory batch covering every line of this order.
    pub fn stock_lines(&self) -> Vec<StockLine> {
        StockLine::batch(&self.items)
    }
}

/// Rejects `(expected, next)` pairs that are not a single forward step.
fn ensure_forward_step(expected: OrderStatus, next: OrderStatus) -> Result<(), OrderError> {
    if expected.next() == Some(next) {
        Ok(())
    } else {
        Err(OrderError::IllegalTransition {
            from: expected,
            to: next,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
