use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

pub type OrderId = Uuid;
pub type AddressId = Uuid;
pub type CustomerId = i64;
pub type ProductId = i64;

/// A line item as it exists on a placed order. Fixed once the order is created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    OrderPlaced,
    PendingToProcessing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The single forward step out of this status, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::OrderPlaced => Some(OrderStatus::PendingToProcessing),
            OrderStatus::PendingToProcessing => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::OrderPlaced => "ORDER_PLACED",
            OrderStatus::PendingToProcessing => "PENDING_TO_PROCESSING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "ORDER_PLACED" => Some(OrderStatus::OrderPlaced),
            "PENDING_TO_PROCESSING" => Some(OrderStatus::PendingToProcessing),
            "OUT_FOR_DELIVERY" => Some(OrderStatus::OutForDelivery),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery address attached to an order.
///
/// `order_id` points back at the owning order for display only; the order
/// holds the address by value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub id: AddressId,
    pub order_id: OrderId,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// The mutable part of a delivery address.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    pub street_name: String,
    pub street_number: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl AddressFields {
    pub fn new(
        street_name: impl Into<String>,
        street_number: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street_name: street_name.into(),
            street_number: street_number.into(),
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
        }
    }
}

// ============================================================================
// Creation drafts
// ============================================================================
//
// Clients may omit any field. The validator decides what is acceptable and
// turns the draft items into `OrderItem`s.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub total_price: Decimal,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub quantity: i32,
}

impl NewOrderItem {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id: Some(product_id),
            quantity,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_forward_chain() {
        assert_eq!(OrderStatus::OrderPlaced.next(), Some(OrderStatus::PendingToProcessing));
        assert_eq!(OrderStatus::PendingToProcessing.next(), Some(OrderStatus::OutForDelivery));
        assert_eq!(OrderStatus::OutForDelivery.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::OrderPlaced.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::PendingToProcessing).unwrap();
        assert_eq!(json, "\"PENDING_TO_PROCESSING\"");

        for status in [
            OrderStatus::OrderPlaced,
            OrderStatus::PendingToProcessing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn test_draft_tolerates_missing_fields() {
        let order: NewOrder = serde_json::from_str("{}").unwrap();
        assert!(order.customer_id.is_none());
        assert_eq!(order.total_price, Decimal::ZERO);

        let item: NewOrderItem = serde_json::from_str(r#"{"quantity": 2}"#).unwrap();
        assert!(item.product_id.is_none());
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_address_flattens_fields() {
        let address = DeliveryAddress {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            fields: AddressFields::new("Haut str", "10", "Berlin", "Berlin", "10115"),
        };

        let value = serde_json::to_value(&address).unwrap();
        assert_eq!(value["streetName"], "Haut str");
        assert_eq!(value["zipCode"], "10115");
    }
}
