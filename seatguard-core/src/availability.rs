use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use crate::cache::AvailabilityCache;
use crate::invalidation::availability_key;
use crate::models::Availability;
use crate::repository::SeatStore;
use crate::{BookingError, BookingResult};

/// Read-through availability lookups.
///
/// Advisory only: counts are read without the event lock and may be stale
/// by up to the cache TTL. Capacity is enforced by the reservation engine.
pub struct AvailabilityReader {
    store: Arc<dyn SeatStore>,
    cache: Arc<dyn AvailabilityCache>,
    ttl: Duration,
}

impl AvailabilityReader {
    pub fn new(store: Arc<dyn SeatStore>, cache: Arc<dyn AvailabilityCache>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn get_availability(&self, event_id: i32) -> BookingResult<Availability> {
        let key = availability_key(event_id);

        if let Some(cached) = self.cached(&key).await {
            debug!(event_id, "Availability cache hit");
            return Ok(cached);
        }
        debug!(event_id, "Availability cache miss");

        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;
        let booked = self.store.count_bookings(event_id).await?;
        let availability = Availability::compute(event, booked);

        match serde_json::to_string(&availability) {
            Ok(payload) => {
                if let Err(e) = self.cache.set_with_expiry(&key, &payload, self.ttl).await {
                    warn!(event_id, "Failed to populate availability cache: {}", e);
                }
            }
            Err(e) => warn!(event_id, "Failed to encode availability: {}", e),
        }

        Ok(availability)
    }

    /// A cache outage or an undecodable payload counts as a miss.
    async fn cached(&self, key: &str) -> Option<Availability> {
        let payload = match self.cache.get(key).await {
            Ok(payload) => payload?,
            Err(e) => {
                warn!(key, "Availability cache read failed, falling back to store: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(availability) => Some(availability),
            Err(e) => {
                warn!(key, "Discarding undecodable availability payload: {}", e);
                None
            }
        }
    }
}
