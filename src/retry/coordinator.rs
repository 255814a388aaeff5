use tokio::time::Instant;
use tracing::warn;

use crate::errors::Error;

use super::{RetryOutcome, plan::RetryPlan};

/// Re-runs an operation while it fails with a network, timeout or 5xx error.
pub struct RetryCoordinator {
    plan: RetryPlan,
}

impl RetryCoordinator {
    pub fn new(plan: RetryPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> RetryPlan {
        self.plan.clone()
    }

    /// Runs `op` with the 1-based attempt number until it succeeds, fails with a
    /// non-transient error, or the budget is spent. The last error is returned unchanged.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: &str,
        mut op: F,
    ) -> Result<(T, RetryOutcome), Error>
    where
        F: FnMut(u8) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, Error>> + Send,
    {
        let mut attempt: u8 = 1;
        let start = Instant::now();
        loop {
            match op(attempt).await {
                Ok(value) => {
                    let outcome = RetryOutcome {
                        operation: operation.to_string(),
                        attempts: attempt,
                        success: true,
                        total_delay: start.elapsed(),
                    };
                    outcome.log();
                    return Ok((value, outcome));
                }
                Err(err) => {
                    if attempt >= self.plan.max_attempts || !err.is_retriable() {
                        let outcome = RetryOutcome {
                            operation: operation.to_string(),
                            attempts: attempt,
                            success: false,
                            total_delay: start.elapsed(),
                        };
                        outcome.log();
                        return Err(err);
                    }
                    let delay = self.plan.delay_after_attempt(attempt);
                    warn!(
                        operation = %operation,
                        attempt,
                        max_attempts = self.plan.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "retry.scheduling"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new(RetryPlan::default_plan())
    }
}
