use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use seatguard_core::Availability;
use crate::bookings::positive_id;
use crate::error::AppError;
use crate::extract::AppPath;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BookingCountResponse {
    pub count: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/events/{id}", get(get_event_availability))
        .route("/metrics/{user_id}", get(count_user_bookings))
}

/// GET /api/events/{id}
/// Event with its available seat count (may lag by up to the cache TTL)
pub async fn get_event_availability(
    State(state): State<AppState>,
    AppPath(event_id): AppPath<i32>,
) -> Result<Json<Availability>, AppError> {
    let event_id = positive_id(event_id, "id")?;
    Ok(Json(state.bookings.get_availability(event_id).await?))
}

/// GET /metrics/{user_id}
pub async fn count_user_bookings(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<String>,
) -> Result<Json<BookingCountResponse>, AppError> {
    let count = state.bookings.count_bookings_by_user(&user_id).await?;
    Ok(Json(BookingCountResponse { count }))
}
