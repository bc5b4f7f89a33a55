use std::sync::Arc;
use crate::availability::AvailabilityReader;
use crate::cache::AvailabilityCache;
use crate::cancellation::CancellationHandler;
use crate::invalidation::InvalidationPolicy;
use crate::models::{Availability, Booking, BookingDetails};
use crate::repository::SeatStore;
use crate::reservation::ReservationEngine;
use crate::settings::EngineSettings;
use crate::{BookingError, BookingResult};

/// Entry point for the transport layer.
///
/// Owns one engine per operation, all sharing the injected store and cache
/// handles. There is no global instance; construct one per process and share
/// it behind an `Arc`.
pub struct BookingService {
    store: Arc<dyn SeatStore>,
    reservations: ReservationEngine,
    availability: AvailabilityReader,
    cancellations: CancellationHandler,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn SeatStore>,
        cache: Arc<dyn AvailabilityCache>,
        settings: EngineSettings,
    ) -> Self {
        let invalidation = InvalidationPolicy::new(
            cache.clone(),
            settings.invalidation_retry,
            settings.post_commit_invalidation,
        );

        Self {
            reservations: ReservationEngine::new(store.clone(), invalidation.clone(), settings.reservation_retry),
            availability: AvailabilityReader::new(store.clone(), cache, settings.cache_ttl),
            cancellations: CancellationHandler::new(store.clone(), invalidation),
            store,
        }
    }

    pub async fn reserve(&self, event_id: i32, user_id: &str) -> BookingResult<Booking> {
        self.reservations.reserve(event_id, user_id).await
    }

    pub async fn get_availability(&self, event_id: i32) -> BookingResult<Availability> {
        self.availability.get_availability(event_id).await
    }

    pub async fn cancel(&self, booking_id: i32) -> BookingResult<bool> {
        self.cancellations.cancel(booking_id).await
    }

    pub async fn get_booking(&self, booking_id: i32) -> BookingResult<BookingDetails> {
        self.store
            .find_booking_details(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    /// Number of bookings held by a user across all events
    pub async fn count_bookings_by_user(&self, user_id: &str) -> BookingResult<i64> {
        Ok(self.store.count_bookings_by_user(user_id).await?)
    }
}
