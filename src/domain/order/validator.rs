use rust_decimal::Decimal;

use super::errors::OrderError;
use super::value_objects::{CustomerId, NewOrder, NewOrderItem, OrderItem};

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub customer_id: CustomerId,
    pub total_price: Decimal,
    pub items: Vec<OrderItem>,
}

/// Structural checks on a new order, run before any side effect.
///
/// Stops at the first failure. On success the draft items come back as
/// `OrderItem`s in submission order.
///
/// Quantities are not range-checked: zero and negative counts pass.
pub fn validate_new_order(
    order: Option<&NewOrder>,
    items: Option<&[Option<NewOrderItem>]>,
) -> Result<ValidatedOrder, OrderError> {
    let order = order.ok_or_else(|| OrderError::invalid("Order cannot be null."))?;

    let customer_id = order
        .customer_id
        .ok_or_else(|| OrderError::invalid("Customer ID cannot be null."))?;

    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(OrderError::invalid("Order must contain at least one item.")),
    };

    let mut validated = Vec::with_capacity(items.len());
    for item in items {
        let item = item
            .as_ref()
            .ok_or_else(|| OrderError::invalid("Order item cannot be null."))?;
        let product_id = item
            .product_id
            .ok_or_else(|| OrderError::invalid("Product ID cannot be null."))?;

        validated.push(OrderItem {
            product_id,
            quantity: item.quantity,
        });
    }

    if order.total_price < Decimal::ZERO {
        return Err(OrderError::invalid("Total price cannot be negative."));
    }

    Ok(ValidatedOrder {
        customer_id,
        total_price: order.total_price,
        items: validated,
    })
}
