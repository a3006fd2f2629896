// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// - Orders created and cancelled
// - Status transitions by (from, to)
// - Inventory calls by operation and outcome, with latency
// - Not-found lookups split by internal cause
// - Inventory circuit breaker state
//
// Served from /metrics by the API server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub orders_cancelled: IntCounter,
    pub order_transitions: IntCounterVec,
    pub order_not_found: IntCounterVec,

    pub inventory_calls: IntCounterVec,
    pub inventory_call_duration: HistogramVec,
    pub inventory_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders placed")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_cancelled = IntCounter::new("orders_cancelled_total", "Total orders cancelled")?;
        registry.register(Box::new(orders_cancelled.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Committed order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let order_not_found = IntCounterVec::new(
            Opts::new("order_not_found_total", "Order lookups that failed, by internal cause"),
            &["cause"],
        )?;
        registry.register(Box::new(order_not_found.clone()))?;

        let inventory_calls = IntCounterVec::new(
            Opts::new("inventory_calls_total", "Inventory service calls"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(inventory_calls.clone()))?;

        let inventory_call_duration = HistogramVec::new(
            HistogramOpts::new("inventory_call_duration_seconds", "Inventory service call duration")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(inventory_call_duration.clone()))?;

        let inventory_circuit_state = IntGauge::new(
            "inventory_circuit_breaker_state",
            "Inventory circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(inventory_circuit_state.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_cancelled,
            order_transitions,
            order_not_found,
            inventory_calls,
            inventory_call_duration,
            inventory_circuit_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
