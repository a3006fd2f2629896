use super::value_objects::{AddressFields, AddressId, NewOrder, NewOrderItem, OrderId};

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        order: Option<NewOrder>,
        items: Option<Vec<Option<NewOrderItem>>>,
    },
    ProcessPending {
        order_id: OrderId,
    },
    SendOutForDelivery {
        order_id: OrderId,
    },
    MarkDelivered {
        order_id: OrderId,
    },
    CancelOrder {
        order_id: OrderId,
        reason: String,
    },
    AddDeliveryAddress {
        order_id: OrderId,
        address: AddressFields,
    },
    UpdateDeliveryAddress {
        order_id: OrderId,
        address_id: AddressId,
        address: AddressFields,
    },
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::PlaceOrder { .. } => "PlaceOrder",
            OrderCommand::ProcessPending { .. } => "ProcessPending",
            OrderCommand::SendOutForDelivery { .. } => "SendOutForDelivery",
            OrderCommand::MarkDelivered { .. } => "MarkDelivered",
            OrderCommand::CancelOrder { .. } => "CancelOrder",
            OrderCommand::AddDeliveryAddress { .. } => "AddDeliveryAddress",
            OrderCommand::UpdateDeliveryAddress { .. } => "UpdateDeliveryAddress",
        }
    }
}
