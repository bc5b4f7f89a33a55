pub mod models;
pub mod repository;
pub mod cache;
pub mod settings;
pub mod retry;
pub mod invalidation;
pub mod reservation;
pub mod availability;
pub mod cancellation;
pub mod service;

pub use models::{Availability, Booking, BookingDetails, Event};
pub use repository::{LockedEvent, PendingCancellation, SeatStore, StoreError};
pub use cache::{AvailabilityCache, CacheError};
pub use settings::EngineSettings;
pub use service::BookingService;

/// Outcome taxonomy for every booking operation.
///
/// "Does not exist" and "exists but refused" stay separate variants so the
/// transport layer can map them without inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Event not found: {0}")]
    EventNotFound(i32),
    #[error("Booking not found: {0}")]
    BookingNotFound(i32),
    #[error("User {user_id} already holds a seat for event {event_id}")]
    Conflict { event_id: i32, user_id: String },
    #[error("Event {event_id} is fully booked ({total_seats} seats)")]
    CapacityExceeded { event_id: i32, total_seats: i32 },
    #[error("Transient store failure: {0}")]
    Transient(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Availability cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("Store error: {0}")]
    Store(String),
}

impl BookingError {
    /// Only transient failures may be retried with identical inputs.
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BookingError::EventNotFound(_) | BookingError::BookingNotFound(_))
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout(msg) | StoreError::SerializationFailure(msg) => {
                BookingError::Transient(msg)
            }
            StoreError::UniqueViolation(msg) | StoreError::Backend(msg) => BookingError::Store(msg),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
