use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub total_seats: i32,
}

/// One admitted seat. Created by a reservation, removed by a cancellation,
/// never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i32,
    pub event_id: i32,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub event: Event,
}

/// Derived availability snapshot. Only ever stored as a cache payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub event: Event,
    pub available_seats: i64,
}

impl Availability {
    pub fn compute(event: Event, booked: i64) -> Self {
        let available_seats = i64::from(event.total_seats) - booked;
        Self { event, available_seats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_payload_shape() {
        let event = Event { id: 7, name: "Concert".to_string(), total_seats: 5 };
        let availability = Availability::compute(event, 2);
        assert_eq!(availability.available_seats, 3);

        let json = serde_json::to_value(&availability).unwrap();
        assert_eq!(json["available_seats"], 3);
        assert_eq!(json["event"]["total_seats"], 5);

        let back: Availability = serde_json::from_value(json).unwrap();
        assert_eq!(back, availability);
    }

    #[test]
    fn test_booking_details_flattens_booking() {
        let details = BookingDetails {
            booking: Booking {
                id: 3,
                event_id: 7,
                user_id: "user-1".to_string(),
                created_at: Utc::now(),
            },
            event: Event { id: 7, name: "Concert".to_string(), total_seats: 5 },
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["event"]["name"], "Concert");
    }
}
