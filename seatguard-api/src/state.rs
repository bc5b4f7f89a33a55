use std::sync::Arc;
use seatguard_core::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
}
