use std::sync::Arc;
use std::time::Instant;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::{NotFoundCause, OrderError};
use super::locks::OrderLocks;
use super::validator::validate_new_order;
use super::value_objects::{AddressFields, AddressId, NewOrder, NewOrderItem, OrderId, OrderStatus};
use crate::inventory::{InventoryFailure, InventoryGateway, StockLine, StockOperation};
use crate::metrics::Metrics;
use crate::store::OrderStore;

// ============================================================================
// Order Lifecycle
// ============================================================================
//
// Orchestrates: Validator → Inventory Gateway → Order Store
//
// - Stock is reserved before an order row exists, and returned before a
//   cancellation is written. A failed inventory call leaves the store alone.
// - Every change to an existing order holds that order's lock from read to
//   save, so guarded transitions cannot interleave.
// - When the inventory call succeeds but the save fails, create releases the
//   reserved batch again; cancel can only log, since stock is already back.
//
// ============================================================================

pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
    inventory: Arc<dyn InventoryGateway>,
    locks: OrderLocks,
    metrics: Arc<Metrics>,
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn OrderStore>,
        inventory: Arc<dyn InventoryGateway>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            inventory,
            locks: OrderLocks::new(),
            metrics,
        }
    }

    /// Dispatch a command to the matching operation.
    pub async fn execute(&self, command: OrderCommand) -> Result<Order, OrderError> {
        tracing::debug!(command = command.name(), "Executing order command");

        match command {
            OrderCommand::PlaceOrder { order, items } => self.create(order, items).await,
            OrderCommand::ProcessPending { order_id } => self.process_pending(order_id).await,
            OrderCommand::SendOutForDelivery { order_id } => {
                self.send_out_for_delivery(order_id).await
            }
            OrderCommand::MarkDelivered { order_id } => self.mark_delivered(order_id).await,
            OrderCommand::CancelOrder { order_id, reason } => self.cancel(order_id, reason).await,
            OrderCommand::AddDeliveryAddress { order_id, address } => {
                self.add_delivery_address(order_id, address).await
            }
            OrderCommand::UpdateDeliveryAddress {
                order_id,
                address_id,
                address,
            } => {
                self.update_delivery_address(order_id, address_id, address)
                    .await
            }
        }
    }

    /// Validate, reserve stock, then persist a new order in `ORDER_PLACED`.
    pub async fn create(
        &self,
        order: Option<NewOrder>,
        items: Option<Vec<Option<NewOrderItem>>>,
    ) -> Result<Order, OrderError> {
        let validated = validate_new_order(order.as_ref(), items.as_deref())?;

        let batch = StockLine::batch(&validated.items);
        self.call_inventory(StockOperation::Reserve, &batch)
            .await
            .map_err(OrderError::ValidationFailed)?;

        let order = Order::place(validated.customer_id, validated.total_price, validated.items);
        let order_id = order.id;

        match self.store.save(order).await {
            Ok(saved) => {
                self.metrics.orders_created.inc();
                tracing::info!(
                    order_id = %saved.id,
                    customer_id = saved.customer_id,
                    item_count = saved.items.len(),
                    "Order placed"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Order save failed after stock was reserved, releasing reservation"
                );
                let released = self.call_inventory(StockOperation::Release, &batch).await;
                if let Err(release_err) = released {
                    tracing::error!(
                        order_id = %order_id,
                        error = %release_err,
                        batch = ?batch,
                        "Compensating release failed, stock stays deducted"
                    );
                }
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.load(order_id).await
    }

    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.find_all().await?)
    }

    /// Guarded transition: only applies while the stored status is `expected`.
    ///
    /// A missing order or one in another status is `OrderNotFound`. A pair
    /// that is not a single forward step is `IllegalTransition` and nothing
    /// is written.
    pub async fn advance(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = match self.store.find_by_id_and_status(order_id, expected).await? {
            Some(order) => order,
            None => return Err(self.not_found(order_id, Some(expected)).await),
        };

        order.transition(expected, next)?;
        let saved = self.store.save(order).await?;

        self.metrics
            .order_transitions
            .with_label_values(&[expected.as_str(), next.as_str()])
            .inc();
        tracing::info!(
            order_id = %order_id,
            from = %expected,
            to = %next,
            "Order status advanced"
        );

        Ok(saved)
    }

    pub async fn process_pending(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.advance(order_id, OrderStatus::OrderPlaced, OrderStatus::PendingToProcessing)
            .await
    }

    pub async fn send_out_for_delivery(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.advance(order_id, OrderStatus::PendingToProcessing, OrderStatus::OutForDelivery)
            .await
    }

    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.advance(order_id, OrderStatus::OutForDelivery, OrderStatus::Delivered)
            .await
    }

    /// Return the order's stock, then persist it as `CANCELLED`.
    ///
    /// If the release fails nothing is written and the stored order keeps
    /// its previous status.
    pub async fn cancel(
        &self,
        order_id: OrderId,
        reason: impl Into<String>,
    ) -> Result<Order, OrderError> {
        let reason = reason.into();
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(order_id).await?;
        let previous = order.status;
        if previous.is_terminal() {
            tracing::warn!(
                order_id = %order_id,
                status = %previous,
                "Cancelling an order that is already in a terminal status"
            );
        }

        order.cancel(reason);

        let batch = order.stock_lines();
        self.call_inventory(StockOperation::Release, &batch)
            .await
            .map_err(|failure| {
                tracing::warn!(
                    order_id = %order_id,
                    status = %previous,
                    error = %failure,
                    "Inventory return failed, order left unchanged"
                );
                OrderError::InventoryReturnFailure(failure)
            })?;

        match self.store.save(order).await {
            Ok(saved) => {
                self.metrics.orders_cancelled.inc();
                tracing::info!(
                    order_id = %order_id,
                    from = %previous,
                    reason = ?saved.cancellation_reason,
                    "Order cancelled"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    batch = ?batch,
                    "Stock was returned but the cancellation could not be saved"
                );
                Err(e.into())
            }
        }
    }

    pub async fn add_delivery_address(
        &self,
        order_id: OrderId,
        address: AddressFields,
    ) -> Result<Order, OrderError> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(order_id).await?;
        let address_id = order.add_delivery_address(address);
        let saved = self.store.save(order).await?;

        tracing::info!(order_id = %order_id, address_id = %address_id, "Delivery address added");
        Ok(saved)
    }

    pub async fn update_delivery_address(
        &self,
        order_id: OrderId,
        address_id: AddressId,
        address: AddressFields,
    ) -> Result<Order, OrderError> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.load(order_id).await?;
        if let Err(e) = order.update_delivery_address(address_id, address) {
            tracing::warn!(
                order_id = %order_id,
                address_id = %address_id,
                "Delivery address not found"
            );
            return Err(e);
        }
        let saved = self.store.save(order).await?;

        tracing::info!(order_id = %order_id, address_id = %address_id, "Delivery address updated");
        Ok(saved)
    }

    // ------------------------------------------------------------------------

    async fn load(&self, order_id: OrderId) -> Result<Order, OrderError> {
        match self.store.find_by_id(order_id).await? {
            Some(order) => Ok(order),
            None => Err(self.not_found(order_id, None).await),
        }
    }

    /// Build the not-found error, working out the internal cause. For a
    /// guarded read this costs one extra lookup, done under the order lock.
    async fn not_found(&self, order_id: OrderId, expected: Option<OrderStatus>) -> OrderError {
        let cause = match expected {
            None => NotFoundCause::Absent,
            Some(expected) => match self.store.find_by_id(order_id).await {
                Ok(Some(order)) => NotFoundCause::StatusMismatch {
                    expected,
                    actual: order.status,
                },
                Ok(None) => NotFoundCause::Absent,
                Err(e) => {
                    tracing::debug!(order_id = %order_id, error = %e, "Diagnostic lookup failed");
                    NotFoundCause::Absent
                }
            },
        };

        self.metrics
            .order_not_found
            .with_label_values(&[cause.label()])
            .inc();
        tracing::warn!(order_id = %order_id, cause = ?cause, "Order not found");

        OrderError::OrderNotFound { order_id, cause }
    }

    async fn call_inventory(
        &self,
        operation: StockOperation,
        batch: &[StockLine],
    ) -> Result<(), InventoryFailure> {
        let started = Instant::now();
        let result = self.inventory.execute(operation, batch).await;

        let outcome = match &result {
            Ok(()) => "ok",
            Err(failure) => failure.outcome_label(),
        };
        self.metrics
            .inventory_calls
            .with_label_values(&[operation.as_str(), outcome])
            .inc();
        self.metrics
            .inventory_call_duration
            .with_label_values(&[operation.as_str()])
            .observe(started.elapsed().as_secs_f64());
        if let Some(state) = self.inventory.circuit_state() {
            self.metrics.inventory_circuit_state.set(state.as_gauge());
        }

        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
