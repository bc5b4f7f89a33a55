use std::sync::Arc;
use tracing::{debug, warn};
use crate::cache::AvailabilityCache;
use crate::retry::RetryPolicy;
use crate::{BookingError, BookingResult};

/// Cache key holding the availability snapshot of one event.
pub fn availability_key(event_id: i32) -> String {
    format!("event:{}:available_seats", event_id)
}

/// Eviction rule for cached availability.
///
/// Every change to an event's booking count goes through [`invalidate`]
/// before its transaction commits. A failed eviction aborts the change, so a
/// committed booking never leaves a cached value behind that only the TTL
/// would clear. [`invalidate_after_commit`] repeats the eviction once the
/// commit is visible to drop values filled from a pre-commit snapshot.
///
/// [`invalidate`]: InvalidationPolicy::invalidate
/// [`invalidate_after_commit`]: InvalidationPolicy::invalidate_after_commit
#[derive(Clone)]
pub struct InvalidationPolicy {
    cache: Arc<dyn AvailabilityCache>,
    retry: RetryPolicy,
    post_commit: bool,
}

impl InvalidationPolicy {
    pub fn new(cache: Arc<dyn AvailabilityCache>, retry: RetryPolicy, post_commit: bool) -> Self {
        Self { cache, retry, post_commit }
    }

    /// Delete the availability key, retrying until confirmed or attempts run out.
    pub async fn invalidate(&self, event_id: i32) -> BookingResult<()> {
        let key = availability_key(event_id);
        let mut attempt = 1;
        loop {
            match self.cache.delete(&key).await {
                Ok(()) => {
                    debug!(event_id, "Availability cache invalidated");
                    return Ok(());
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    warn!(event_id, attempt, "Cache invalidation failed, retrying: {}", e);
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(BookingError::CacheUnavailable(e.to_string())),
            }
        }
    }

    /// Best-effort eviction after commit; the TTL bounds what a failure leaves.
    pub async fn invalidate_after_commit(&self, event_id: i32) {
        if !self.post_commit {
            return;
        }
        if let Err(e) = self.cache.delete(&availability_key(event_id)).await {
            warn!(event_id, "Post-commit cache invalidation failed: {}", e);
        }
    }
}
