use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Deserialize;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Stops calling a remote service after repeated failures and lets a probe
// through once the reset timeout has elapsed.
//
// - Closed:   calls pass, consecutive failures are counted
// - Open:     calls are refused until `reset_timeout` has elapsed
// - HalfOpen: one probe at a time passes, other calls are refused;
//             `success_threshold` successes close the circuit, any failure
//             opens it again
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_gauge(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Seconds to stay open before letting a probe through
    pub reset_timeout_secs: u64,
    /// Successes in half-open needed to close again
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 30,
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32, probing: bool },
}

#[derive(Clone)]
pub struct CircuitBreaker {
    phase: Arc<Mutex<Phase>>,
    failure_threshold: u32,
    success_threshold: u32,
    reset_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            phase: Arc::new(Mutex::new(Phase::Closed { failures: 0 })),
            failure_threshold: config.failure_threshold.max(1),
            success_threshold: config.success_threshold.max(1),
            reset_timeout: config.reset_timeout(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `operation` unless the circuit is open. Only `Err` results count
    /// against the circuit.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let mut probe = ProbeGuard {
            breaker: self,
            armed: self.admit::<E>()?,
        };

        let result = operation.await;
        probe.armed = false;

        match result {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    /// Returns whether the admitted call is the half-open probe.
    fn admit<E>(&self) -> Result<bool, CircuitBreakerError<E>> {
        let mut phase = self.lock();
        match *phase {
            Phase::Closed { .. } => Ok(false),
            Phase::Open { since } => {
                if since.elapsed() < self.reset_timeout {
                    return Err(CircuitBreakerError::CircuitOpen);
                }
                tracing::info!("Circuit breaker half-open, letting a probe through");
                *phase = Phase::HalfOpen {
                    successes: 0,
                    probing: true,
                };
                Ok(true)
            }
            Phase::HalfOpen { probing: true, .. } => Err(CircuitBreakerError::CircuitOpen),
            Phase::HalfOpen {
                successes,
                probing: false,
            } => {
                *phase = Phase::HalfOpen {
                    successes,
                    probing: true,
                };
                Ok(true)
            }
        }
    }

    /// A probe that never completed frees the slot for the next caller.
    fn abandon_probe(&self) {
        let mut phase = self.lock();
        if let Phase::HalfOpen {
            successes,
            probing: true,
        } = *phase
        {
            *phase = Phase::HalfOpen {
                successes,
                probing: false,
            };
        }
    }

    fn on_success(&self) {
        let mut phase = self.lock();
        match *phase {
            Phase::HalfOpen { successes, .. } => {
                let successes = successes + 1;
                if successes >= self.success_threshold {
                    tracing::info!(successes, "Circuit breaker closed");
                    *phase = Phase::Closed { failures: 0 };
                } else {
                    *phase = Phase::HalfOpen {
                        successes,
                        probing: false,
                    };
                }
            }
            Phase::Closed { .. } => *phase = Phase::Closed { failures: 0 },
            Phase::Open { .. } => {}
        }
    }

    fn on_failure(&self) {
        let mut phase = self.lock();
        match *phase {
            Phase::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.failure_threshold {
                    tracing::warn!(failures, "Circuit breaker opened");
                    *phase = Phase::Open { since: Instant::now() };
                } else {
                    *phase = Phase::Closed { failures };
                }
            }
            Phase::HalfOpen { .. } => {
                tracing::warn!("Probe failed, circuit breaker re-opened");
                *phase = Phase::Open { since: Instant::now() };
            }
            Phase::Open { .. } => *phase = Phase::Open { since: Instant::now() },
        }
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.abandon_probe();
        }
    }
}
