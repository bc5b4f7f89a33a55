//! In-process store and cache.
//!
//! Same contracts as the Postgres and Redis adapters: a per-event async mutex
//! stands in for the row lock, writes inside a [`LockedEvent`] stay private
//! until commit, and the unique (event, user) rule is re-checked on commit.
//! Used by the test suites.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use seatguard_core::cache::{AvailabilityCache, CacheError};
use seatguard_core::repository::{LockedEvent, PendingCancellation, SeatStore, StoreError, StoreResult};
use seatguard_core::{Booking, BookingDetails, Event};

#[derive(Default)]
struct MemoryState {
    events: BTreeMap<i32, Event>,
    bookings: BTreeMap<i32, Booking>,
    /// Bookings deleted by an uncommitted cancellation. Still counted.
    cancelling: HashSet<i32>,
    last_event_id: i32,
    last_booking_id: i32,
}

impl MemoryState {
    fn find_booking(&self, event_id: i32, user_id: &str) -> Option<&Booking> {
        self.bookings
            .values()
            .find(|b| b.event_id == event_id && b.user_id == user_id)
    }

    fn count_for_event(&self, event_id: i32) -> i64 {
        self.bookings.values().filter(|b| b.event_id == event_id).count() as i64
    }
}

type SharedState = Arc<Mutex<MemoryState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MemorySeatStore {
    state: SharedState,
    row_locks: Mutex<HashMap<i32, Arc<tokio::sync::Mutex<()>>>>,
    lock_timeout: Duration,
}

impl MemorySeatStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            row_locks: Mutex::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Events are created outside the booking protocol, like seeded rows.
    pub fn insert_event(&self, name: &str, total_seats: i32) -> Event {
        let mut state = lock(&self.state);
        state.last_event_id += 1;
        let event = Event {
            id: state.last_event_id,
            name: name.to_string(),
            total_seats: total_seats.max(0),
        };
        state.events.insert(event.id, event.clone());
        event
    }

    pub fn bookings_for_event(&self, event_id: i32) -> Vec<Booking> {
        lock(&self.state)
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect()
    }

    fn row_lock(&self, event_id: i32) -> Arc<tokio::sync::Mutex<()>> {
        self.row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_id)
            .or_default()
            .clone()
    }
}

impl Default for MemorySeatStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn lock_event(&self, event_id: i32) -> StoreResult<Option<Box<dyn LockedEvent>>> {
        // Events are never deleted, so a missing row needs no lock.
        if !lock(&self.state).events.contains_key(&event_id) {
            return Ok(None);
        }

        let row_lock = self.row_lock(event_id);
        let guard = tokio::time::timeout(self.lock_timeout, row_lock.lock_owned())
            .await
            .map_err(|_| {
                StoreError::LockTimeout(format!(
                    "event {} lock not acquired within {:?}",
                    event_id, self.lock_timeout
                ))
            })?;

        let event = lock(&self.state).events.get(&event_id).cloned();
        Ok(event.map(|event| {
            Box::new(MemoryLockedEvent {
                state: self.state.clone(),
                event,
                pending: Vec::new(),
                _row_lock: guard,
            }) as Box<dyn LockedEvent>
        }))
    }

    async fn begin_cancellation(
        &self,
        booking_id: i32,
    ) -> StoreResult<Option<Box<dyn PendingCancellation>>> {
        let mut state = lock(&self.state);
        if state.cancelling.contains(&booking_id) {
            return Ok(None);
        }
        let Some(booking) = state.bookings.get(&booking_id).cloned() else {
            return Ok(None);
        };
        state.cancelling.insert(booking_id);

        Ok(Some(Box::new(MemoryPendingCancellation {
            state: self.state.clone(),
            booking,
        }) as Box<dyn PendingCancellation>))
    }

    async fn find_event(&self, event_id: i32) -> StoreResult<Option<Event>> {
        Ok(lock(&self.state).events.get(&event_id).cloned())
    }

    async fn find_booking_details(&self, booking_id: i32) -> StoreResult<Option<BookingDetails>> {
        let state = lock(&self.state);
        let details = state.bookings.get(&booking_id).and_then(|booking| {
            state.events.get(&booking.event_id).map(|event| BookingDetails {
                booking: booking.clone(),
                event: event.clone(),
            })
        });
        Ok(details)
    }

    async fn count_bookings(&self, event_id: i32) -> StoreResult<i64> {
        Ok(lock(&self.state).count_for_event(event_id))
    }

    async fn count_bookings_by_user(&self, user_id: &str) -> StoreResult<i64> {
        let state = lock(&self.state);
        Ok(state.bookings.values().filter(|b| b.user_id == user_id).count() as i64)
    }
}

struct MemoryLockedEvent {
    state: SharedState,
    event: Event,
    pending: Vec<Booking>,
    _row_lock: OwnedMutexGuard<()>,
}

#[async_trait]
impl LockedEvent for MemoryLockedEvent {
    fn event(&self) -> &Event {
        &self.event
    }

    async fn find_booking(&mut self, user_id: &str) -> StoreResult<Option<Booking>> {
        if let Some(b) = self.pending.iter().find(|b| b.user_id == user_id) {
            return Ok(Some(b.clone()));
        }
        Ok(lock(&self.state).find_booking(self.event.id, user_id).cloned())
    }

    async fn count_bookings(&mut self) -> StoreResult<i64> {
        Ok(lock(&self.state).count_for_event(self.event.id) + self.pending.len() as i64)
    }

    async fn insert_booking(&mut self, user_id: &str) -> StoreResult<Booking> {
        if self.pending.iter().any(|b| b.user_id == user_id) {
            return Err(StoreError::UniqueViolation(format!("({}, {})", self.event.id, user_id)));
        }
        let id = {
            let mut state = lock(&self.state);
            state.last_booking_id += 1;
            state.last_booking_id
        };
        let booking = Booking {
            id,
            event_id: self.event.id,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.pending.push(booking.clone());
        Ok(booking)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut state = lock(&self.state);
        for booking in &self.pending {
            if state.find_booking(booking.event_id, &booking.user_id).is_some() {
                return Err(StoreError::UniqueViolation(format!(
                    "({}, {})",
                    booking.event_id, booking.user_id
                )));
            }
        }
        for booking in self.pending.iter().cloned() {
            state.bookings.insert(booking.id, booking);
        }
        debug!(event_id = self.event.id, "Memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

struct MemoryPendingCancellation {
    state: SharedState,
    booking: Booking,
}

#[async_trait]
impl PendingCancellation for MemoryPendingCancellation {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        lock(&self.state).bookings.remove(&self.booking.id);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

// Clears the in-flight marker on commit, rollback and drop alike.
impl Drop for MemoryPendingCancellation {
    fn drop(&mut self) {
        lock(&self.state).cancelling.remove(&self.booking.id);
    }
}

/// TTL cache backed by a `HashMap`, with switches to simulate an outage.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    sets: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fails both `set_with_expiry` and `delete`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }

    /// Seed a raw value, bypassing the counters.
    pub fn put_raw(&self, key: &str, value: &str, ttl: Duration) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Successful deletes, including deletes of absent keys.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError("memory cache read failure".to_string()));
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError("memory cache write failure".to_string()));
        }
        self.put_raw(key, value, ttl);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError("memory cache write failure".to_string()));
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
