use async_trait::async_trait;

use super::{InventoryFailure, InventoryGateway, StockLine, StockOperation};
use crate::config::InventoryConfig;
use crate::utils::{CircuitBreaker, CircuitBreakerError, CircuitState};

/// Inventory gateway over HTTP.
///
/// Each call is one POST of the JSON batch. 2xx is success, any other status
/// is a rejection carrying the response body, and transport errors (refused
/// connection, timeout, open circuit) surface as `Unavailable`.
pub struct HttpInventoryGateway {
    client: reqwest::Client,
    base_url: String,
    circuit_breaker: CircuitBreaker,
}

impl HttpInventoryGateway {
    pub fn new(config: &InventoryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create inventory HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            circuit_breaker: CircuitBreaker::new(&config.circuit_breaker),
        })
    }

    async fn post(
        &self,
        operation: StockOperation,
        batch: &[StockLine],
    ) -> Result<(), InventoryFailure> {
        let url = format!("{}{}", self.base_url, operation.path());

        // Only transport errors count against the circuit; a rejection is a
        // healthy answer from the service.
        let response = self
            .circuit_breaker
            .call(async {
                self.client
                    .post(&url)
                    .json(batch)
                    .send()
                    .await
            })
            .await;

        let response = match response {
            Ok(response) => response,
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(url = %url, "Circuit breaker open - inventory service unavailable");
                return Err(InventoryFailure::Unavailable(
                    "circuit breaker open for inventory service".to_string(),
                ));
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(url = %url, error = %e, "Inventory request failed");
                return Err(InventoryFailure::Unavailable(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                operation = operation.as_str(),
                lines = batch.len(),
                "Inventory call succeeded"
            );
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<unreadable response body: {}>", e),
        };

        tracing::warn!(
            operation = operation.as_str(),
            status = status.as_u16(),
            body = %body,
            "Inventory service rejected request"
        );

        Err(InventoryFailure::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl InventoryGateway for HttpInventoryGateway {
    async fn reserve(&self, batch: &[StockLine]) -> Result<(), InventoryFailure> {
        self.post(StockOperation::Reserve, batch).await
    }

    async fn release(&self, batch: &[StockLine]) -> Result<(), InventoryFailure> {
        self.post(StockOperation::Release, batch).await
    }

    fn circuit_state(&self) -> Option<CircuitState> {
        Some(self.circuit_breaker.state())
    }
}
