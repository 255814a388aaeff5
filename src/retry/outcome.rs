use std::time::Duration;

use tracing::Level;
use tracing::event;

#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub operation: String,
    pub attempts: u8,
    pub success: bool,
    pub total_delay: Duration,
}

impl RetryOutcome {
    pub fn log(&self) {
        event!(
            Level::INFO,
            operation = %self.operation,
            attempts = self.attempts,
            success = self.success,
            total_delay_ms = u64::try_from(self.total_delay.as_millis()).unwrap_or(u64::MAX),
            "retry.outcome"
        );
    }
}
