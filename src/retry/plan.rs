use std::time::Duration;

use crate::config::RetrySettings;

/// Attempt budget and linear backoff for transient request failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPlan {
    pub max_attempts: u8,
    pub base_delay: Duration,
}

impl RetryPlan {
    pub fn new(max_attempts: u8, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn default_plan() -> Self {
        Self::new(3, Duration::from_secs(1))
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.base_delay_ms),
        )
    }

    /// Delay slept after failed attempt `attempt` (1-based): `base_delay * attempt`,
    /// saturating at `Duration::MAX`.
    pub fn delay_after_attempt(&self, attempt: u8) -> Duration {
        self.base_delay
            .checked_mul(u32::from(attempt.max(1)))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}
