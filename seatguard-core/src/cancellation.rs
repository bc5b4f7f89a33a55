use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::invalidation::InvalidationPolicy;
use crate::repository::SeatStore;
use crate::BookingResult;

/// Deletes bookings. Takes no event lock: a delete only frees capacity.
pub struct CancellationHandler {
    store: Arc<dyn SeatStore>,
    invalidation: InvalidationPolicy,
}

impl CancellationHandler {
    pub fn new(store: Arc<dyn SeatStore>, invalidation: InvalidationPolicy) -> Self {
        Self { store, invalidation }
    }

    /// Returns `false` when the booking does not exist.
    pub async fn cancel(&self, booking_id: i32) -> BookingResult<bool> {
        let Some(pending) = self.store.begin_cancellation(booking_id).await? else {
            debug!(booking_id, "Nothing to cancel");
            return Ok(false);
        };
        let event_id = pending.booking().event_id;

        if let Err(e) = self.invalidation.invalidate(event_id).await {
            if let Err(rollback_err) = pending.rollback().await {
                warn!(booking_id, "Rollback of cancellation failed: {}", rollback_err);
            }
            return Err(e);
        }

        pending.commit().await?;
        self.invalidation.invalidate_after_commit(event_id).await;

        info!(booking_id, event_id, "Booking cancelled");
        Ok(true)
    }
}
