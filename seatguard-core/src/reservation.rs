use std::sync::Arc;
use tracing::{info, warn};
use crate::invalidation::InvalidationPolicy;
use crate::models::Booking;
use crate::repository::{LockedEvent, SeatStore, StoreError};
use crate::retry::RetryPolicy;
use crate::{BookingError, BookingResult};

pub const MAX_USER_ID_LEN: usize = 255;

/// Admission control for seats.
///
/// Each attempt runs inside one store transaction that holds the exclusive
/// lock on the event row, so all reservations of one event are totally
/// ordered while different events proceed in parallel. Transient failures
/// (lock wait timeout, serialization conflict) restart the whole protocol
/// under the configured [`RetryPolicy`].
pub struct ReservationEngine {
    store: Arc<dyn SeatStore>,
    invalidation: InvalidationPolicy,
    retry: RetryPolicy,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn SeatStore>, invalidation: InvalidationPolicy, retry: RetryPolicy) -> Self {
        Self { store, invalidation, retry }
    }

    pub async fn reserve(&self, event_id: i32, user_id: &str) -> BookingResult<Booking> {
        validate_user_id(user_id)?;
        self.retry
            .run("reserve", move || self.attempt(event_id, user_id))
            .await
    }

    async fn attempt(&self, event_id: i32, user_id: &str) -> BookingResult<Booking> {
        let mut locked = self
            .store
            .lock_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        match locked.find_booking(user_id).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                let err = BookingError::Conflict { event_id, user_id: user_id.to_string() };
                return abort(locked, err).await;
            }
            Err(e) => return abort(locked, e.into()).await,
        }

        let booked = match locked.count_bookings().await {
            Ok(count) => count,
            Err(e) => return abort(locked, e.into()).await,
        };
        let total_seats = locked.event().total_seats;
        if booked >= i64::from(total_seats) {
            return abort(locked, BookingError::CapacityExceeded { event_id, total_seats }).await;
        }

        let booking = match locked.insert_booking(user_id).await {
            Ok(booking) => booking,
            Err(e) => return abort(locked, classify(e, event_id, user_id)).await,
        };

        // Evict before the insert becomes durable. If the eviction cannot be
        // confirmed the insert is rolled back.
        if let Err(e) = self.invalidation.invalidate(event_id).await {
            return abort(locked, e).await;
        }

        locked.commit().await.map_err(|e| classify(e, event_id, user_id))?;
        self.invalidation.invalidate_after_commit(event_id).await;

        info!(event_id, booking_id = booking.id, user_id, "Seat reserved ({}/{})", booked + 1, total_seats);
        Ok(booking)
    }
}

fn validate_user_id(user_id: &str) -> BookingResult<()> {
    if user_id.is_empty() {
        return Err(BookingError::ValidationError("user_id must not be empty".to_string()));
    }
    if user_id.chars().count() > MAX_USER_ID_LEN {
        return Err(BookingError::ValidationError(format!(
            "user_id must be at most {} characters",
            MAX_USER_ID_LEN
        )));
    }
    Ok(())
}

/// The store-level unique index on (event_id, user_id) backs up the
/// in-transaction duplicate check.
fn classify(err: StoreError, event_id: i32, user_id: &str) -> BookingError {
    match err {
        StoreError::UniqueViolation(_) => BookingError::Conflict { event_id, user_id: user_id.to_string() },
        other => other.into(),
    }
}

async fn abort<T>(locked: Box<dyn LockedEvent>, err: BookingError) -> BookingResult<T> {
    if let Err(rollback_err) = locked.rollback().await {
        warn!("Rollback after '{}' failed: {}", err, rollback_err);
    }
    Err(err)
}
