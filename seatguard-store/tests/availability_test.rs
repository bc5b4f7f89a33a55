mod common;

use std::time::Duration;
use seatguard_core::invalidation::availability_key;
use seatguard_core::{Availability, BookingError, Event};
use common::harness;

#[tokio::test]
async fn test_reservation_invalidates_cached_availability() {
    let h = harness();
    let event = h.store.insert_event("Concert", 5);

    let before = h.service.get_availability(event.id).await.unwrap();
    assert_eq!(before.available_seats, 5);
    assert!(h.cache.contains(&availability_key(event.id)));

    h.service.reserve(event.id, "alice").await.unwrap();
    assert!(!h.cache.contains(&availability_key(event.id)));

    let after = h.service.get_availability(event.id).await.unwrap();
    assert_eq!(after.available_seats, 4);
    assert_eq!(after.event, event);
}

#[tokio::test]
async fn test_cache_hit_skips_the_store() {
    let h = harness();
    let event = h.store.insert_event("Concert", 5);

    // A cached value is served as-is until it expires or is invalidated.
    let cached = Availability { event: event.clone(), available_seats: 1 };
    h.cache.put_raw(
        &availability_key(event.id),
        &serde_json::to_string(&cached).unwrap(),
        Duration::from_secs(60),
    );

    assert_eq!(h.service.get_availability(event.id).await.unwrap(), cached);
    assert_eq!(h.cache.set_count(), 0);
}

#[tokio::test]
async fn test_missing_event_is_not_cached() {
    let h = harness();

    let err = h.service.get_availability(99).await.unwrap_err();
    assert!(matches!(err, BookingError::EventNotFound(99)));
    assert!(!h.cache.contains(&availability_key(99)));
    assert_eq!(h.cache.set_count(), 0);
}

#[tokio::test]
async fn test_cache_outage_falls_back_to_store() {
    let h = harness();
    let event = h.store.insert_event("Concert", 3);
    h.service.reserve(event.id, "alice").await.unwrap();

    h.cache.set_fail_reads(true);
    h.cache.set_fail_writes(true);

    let availability = h.service.get_availability(event.id).await.unwrap();
    assert_eq!(availability.available_seats, 2);
}

#[tokio::test]
async fn test_undecodable_payload_is_recomputed() {
    let h = harness();
    let event = h.store.insert_event("Concert", 3);
    let key = availability_key(event.id);
    h.cache.put_raw(&key, "not json", Duration::from_secs(60));

    let availability = h.service.get_availability(event.id).await.unwrap();
    assert_eq!(availability.available_seats, 3);
    assert_eq!(h.cache.set_count(), 1);
}

#[tokio::test]
async fn test_cancel_missing_booking_is_idempotent() {
    let h = harness();

    assert!(!h.service.cancel(12345).await.unwrap());
    assert!(!h.service.cancel(12345).await.unwrap());
    assert_eq!(h.cache.delete_count(), 0);
}

#[tokio::test]
async fn test_cancel_invalidates_and_restores_seat() {
    let h = harness();
    let event = h.store.insert_event("Concert", 2);
    let booking = h.service.reserve(event.id, "alice").await.unwrap();

    assert_eq!(h.service.get_availability(event.id).await.unwrap().available_seats, 1);
    assert!(h.service.cancel(booking.id).await.unwrap());
    assert!(!h.cache.contains(&availability_key(event.id)));
    assert_eq!(h.service.get_availability(event.id).await.unwrap().available_seats, 2);

    assert!(!h.service.cancel(booking.id).await.unwrap());
}

#[tokio::test]
async fn test_cancel_keeps_booking_when_cache_is_down() {
    let h = harness();
    let event = h.store.insert_event("Concert", 2);
    let booking = h.service.reserve(event.id, "alice").await.unwrap();

    h.cache.set_fail_writes(true);
    let err = h.service.cancel(booking.id).await.unwrap_err();
    assert!(matches!(err, BookingError::CacheUnavailable(_)));
    assert_eq!(h.store.bookings_for_event(event.id).len(), 1);

    h.cache.set_fail_writes(false);
    assert!(h.service.cancel(booking.id).await.unwrap());
}

#[tokio::test]
async fn test_get_booking_includes_event() {
    let h = harness();
    let event = h.store.insert_event("Concert", 2);
    let booking = h.service.reserve(event.id, "alice").await.unwrap();

    let details = h.service.get_booking(booking.id).await.unwrap();
    assert_eq!(details.booking, booking);
    assert_eq!(
        details.event,
        Event { id: event.id, name: "Concert".to_string(), total_seats: 2 }
    );

    let err = h.service.get_booking(booking.id + 100).await.unwrap_err();
    assert!(matches!(err, BookingError::BookingNotFound(_)));
}

#[tokio::test]
async fn test_count_bookings_by_user_spans_events() {
    let h = harness();
    let first = h.store.insert_event("Concert", 2);
    let second = h.store.insert_event("Play", 2);

    assert_eq!(h.service.count_bookings_by_user("alice").await.unwrap(), 0);
    h.service.reserve(first.id, "alice").await.unwrap();
    h.service.reserve(second.id, "alice").await.unwrap();
    h.service.reserve(second.id, "bob").await.unwrap();

    assert_eq!(h.service.count_bookings_by_user("alice").await.unwrap(), 2);
    assert_eq!(h.service.count_bookings_by_user("bob").await.unwrap(), 1);
}
