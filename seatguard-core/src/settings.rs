use std::time::Duration;
use crate::retry::RetryPolicy;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Tunables for the booking engines. Built from the application config.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub reservation_retry: RetryPolicy,
    pub invalidation_retry: RetryPolicy,
    /// Delete the availability key a second time once the commit is visible.
    pub post_commit_invalidation: bool,
    pub cache_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reservation_retry: RetryPolicy::default(),
            invalidation_retry: RetryPolicy::new(3, Duration::from_millis(10)),
            post_commit_invalidation: true,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}
