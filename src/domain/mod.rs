// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order lifecycle rules, independent of HTTP and storage details. Those
// collaborators are reached through the `InventoryGateway` and `OrderStore`
// traits.
//
// ============================================================================

pub mod order;
