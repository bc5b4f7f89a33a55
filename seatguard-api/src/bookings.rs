use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use seatguard_core::{Booking, BookingDetails};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub event_id: i32,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: i32,
    pub event_id: i32,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            event_id: booking.event_id,
            user_id: booking.user_id,
            created_at: booking.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/reserve", post(reserve_seat))
        .route("/api/bookings/{id}", get(get_booking).delete(cancel_booking))
}

pub(crate) fn positive_id(id: i32, what: &str) -> Result<i32, AppError> {
    if id < 1 {
        return Err(AppError::ValidationError(format!("{} must be >= 1", what)));
    }
    Ok(id)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/bookings/reserve
pub async fn reserve_seat(
    State(state): State<AppState>,
    AppJson(req): AppJson<ReserveRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let event_id = positive_id(req.event_id, "event_id")?;
    let booking = state.bookings.reserve(event_id, &req.user_id).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /api/bookings/{id}
/// Booking together with its event
pub async fn get_booking(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> Result<Json<BookingDetails>, AppError> {
    let booking_id = positive_id(booking_id, "id")?;
    Ok(Json(state.bookings.get_booking(booking_id).await?))
}

/// DELETE /api/bookings/{id}
pub async fn cancel_booking(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let booking_id = positive_id(booking_id, "id")?;
    if !state.bookings.cancel(booking_id).await? {
        return Err(AppError::NotFoundError(format!("Booking not found: {}", booking_id)));
    }
    Ok(Json(MessageResponse { message: "Booking cancelled".to_string() }))
}
