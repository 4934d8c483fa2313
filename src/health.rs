//! Health aggregation over registered components.
//!
//! Components are checked strictly in registration order and the first failure
//! stops the walk. With a deadline configured, a component still running when
//! it passes is abandoned and [`StoreError::DeadlineExceeded`] is reported;
//! the same error is reported if the walk as a whole finishes late.

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// A component that can report whether it is healthy.
///
/// Implementations do not need to watch the deadline themselves; the
/// registry enforces it.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Short label used in logs and error messages.
    fn name(&self) -> &str;

    async fn healthz(&self) -> StoreResult<()>;
}

/// Ordered set of health components with an optional deadline.
pub struct HealthRegistry {
    checks: RwLock<Vec<Arc<dyn HealthCheck>>>,
    deadline: RwLock<Option<Duration>>,
}

impl HealthRegistry {
    /// Creates an empty registry. `None` disables the deadline.
    pub fn new(deadline: Option<Duration>) -> Self {
        Self {
            checks: RwLock::new(Vec::new()),
            deadline: RwLock::new(deadline),
        }
    }

    /// Appends a component; it will be checked after all earlier ones.
    pub fn register(&self, component: Arc<dyn HealthCheck>) {
        debug!(component = component.name(), "registered health check");
        self.checks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(component);
    }

    pub fn set_deadline(&self, deadline: Option<Duration>) {
        *self.deadline.write().unwrap_or_else(PoisonError::into_inner) = deadline;
    }

    pub fn deadline(&self) -> Option<Duration> {
        *self.deadline.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Names of registered components, in check order.
    pub fn components(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<dyn HealthCheck>> {
        self.checks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Checks every component in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DeadlineExceeded`] if the deadline passes during the walk
    /// - [`StoreError::Unhealthy`] naming the first failing component
    pub async fn check_all(&self) -> StoreResult<()> {
        let budget = self.deadline().filter(|d| !d.is_zero());
        let until = budget.map(|d| Instant::now() + d);

        for component in self.snapshot() {
            let outcome = match (budget, until) {
                (Some(budget), Some(until)) => timeout_at(until, component.healthz())
                    .await
                    .unwrap_or(Err(StoreError::DeadlineExceeded(budget))),
                _ => component.healthz().await,
            };

            let outcome = match (outcome, budget, until) {
                (Ok(()), Some(budget), Some(until)) if Instant::now() >= until => {
                    Err(StoreError::DeadlineExceeded(budget))
                }
                (outcome, ..) => outcome,
            };

            if let Err(err) = outcome {
                warn!(component = component.name(), error = %err, "health check failed");
                return Err(match err {
                    e @ StoreError::DeadlineExceeded(_) => e,
                    e => StoreError::Unhealthy {
                        component: component.name().to_string(),
                        reason: e.to_string(),
                    },
                });
            }
        }

        Ok(())
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
