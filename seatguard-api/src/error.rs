use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use seatguard_core::BookingError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Temporarily unavailable, retry later".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let msg = err.to_string();
        match err {
            BookingError::ValidationError(_) => AppError::ValidationError(msg),
            BookingError::EventNotFound(_) | BookingError::BookingNotFound(_) => AppError::NotFoundError(msg),
            BookingError::Conflict { .. } | BookingError::CapacityExceeded { .. } => AppError::ConflictError(msg),
            BookingError::Transient(_) | BookingError::CacheUnavailable(_) => AppError::ServiceUnavailable(msg),
            BookingError::Store(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_errors_map_to_statuses() {
        let cases = [
            (BookingError::EventNotFound(1), StatusCode::NOT_FOUND),
            (BookingError::BookingNotFound(1), StatusCode::NOT_FOUND),
            (BookingError::Conflict { event_id: 1, user_id: "u".into() }, StatusCode::CONFLICT),
            (BookingError::CapacityExceeded { event_id: 1, total_seats: 1 }, StatusCode::CONFLICT),
            (BookingError::Transient("lock".into()), StatusCode::SERVICE_UNAVAILABLE),
            (BookingError::CacheUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (BookingError::ValidationError("empty".into()), StatusCode::BAD_REQUEST),
            (BookingError::Store("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
