use std::time::Duration;

use jiff::Timestamp;
use tokio::time::Instant;

use crate::config::Config;

/// Rules deciding when a refresh may hit the network.
#[derive(Clone, Debug)]
pub struct RefreshPolicy {
    /// Successful refreshes younger than this short-circuit further refresh requests.
    pub cooldown: Duration,
    /// Access tokens expiring within this margin are refreshed before sending.
    pub expiry_skew: Duration,
}

impl RefreshPolicy {
    pub fn new(cooldown: Duration, expiry_skew: Duration) -> Self {
        Self {
            cooldown,
            expiry_skew,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.refresh_cooldown(), config.refresh_skew())
    }

    pub fn within_cooldown(&self, last_success: Option<Instant>, now: Instant) -> bool {
        match last_success {
            Some(last) => now.saturating_duration_since(last) < self.cooldown,
            None => false,
        }
    }

    pub fn expires_soon(&self, expires_at: Timestamp, now: Timestamp) -> bool {
        let skew = i64::try_from(self.expiry_skew.as_secs()).unwrap_or(i64::MAX);
        expires_at.as_second() <= now.as_second().saturating_add(skew)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(30))
    }
}
