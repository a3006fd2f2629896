// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, DeliveryAddress, drafts)
// - Aggregate (Order and its transitions)
// - Validator (structural checks on new orders)
// - Commands and errors
// - Lifecycle (orchestrates validator, inventory and store)
// - Per-order locks
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod validator;
pub mod locks;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod testing;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use validator::*;
pub use locks::*;
pub use lifecycle::*;
