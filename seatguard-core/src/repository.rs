use async_trait::async_trait;
use crate::models::{Booking, BookingDetails, Event};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Lock wait timed out: {0}")]
    LockTimeout(String),
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for event and booking persistence
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Begin a transaction holding the exclusive row lock of `event_id`.
    ///
    /// Returns `None` (with the transaction already rolled back) when the
    /// event does not exist. A lock wait longer than the configured timeout
    /// fails with [`StoreError::LockTimeout`].
    async fn lock_event(&self, event_id: i32) -> StoreResult<Option<Box<dyn LockedEvent>>>;

    /// Begin a transaction that deletes `booking_id`. `None` if no such booking.
    async fn begin_cancellation(
        &self,
        booking_id: i32,
    ) -> StoreResult<Option<Box<dyn PendingCancellation>>>;

    async fn find_event(&self, event_id: i32) -> StoreResult<Option<Event>>;

    async fn find_booking_details(&self, booking_id: i32) -> StoreResult<Option<BookingDetails>>;

    /// Plain, unlocked count of bookings for an event
    async fn count_bookings(&self, event_id: i32) -> StoreResult<i64>;

    async fn count_bookings_by_user(&self, user_id: &str) -> StoreResult<i64>;
}

/// An open transaction holding the exclusive lock on one event row.
///
/// Dropping the guard without calling [`LockedEvent::commit`] rolls the
/// transaction back and releases the lock.
#[async_trait]
pub trait LockedEvent: Send {
    fn event(&self) -> &Event;

    async fn find_booking(&mut self, user_id: &str) -> StoreResult<Option<Booking>>;

    async fn count_bookings(&mut self) -> StoreResult<i64>;

    async fn insert_booking(&mut self, user_id: &str) -> StoreResult<Booking>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// An uncommitted booking deletion. Dropping it restores the booking.
#[async_trait]
pub trait PendingCancellation: Send {
    fn booking(&self) -> &Booking;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
