use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::debug;
use seatguard_core::repository::{LockedEvent, PendingCancellation, SeatStore, StoreError, StoreResult};
use seatguard_core::{Booking, BookingDetails, Event};

pub struct PostgresSeatStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresSeatStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct EventRow {
    id: i32,
    name: String,
    total_seats: i32,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event { id: row.id, name: row.name, total_seats: row.total_seats }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    event_id: i32,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailsRow {
    id: i32,
    event_id: i32,
    user_id: String,
    created_at: DateTime<Utc>,
    event_name: String,
    total_seats: i32,
}

/// Maps Postgres SQLSTATEs onto the store error taxonomy.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // lock_not_available
            Some("55P03") => return StoreError::LockTimeout(db_err.message().to_string()),
            // serialization_failure, deadlock_detected
            Some("40001") | Some("40P01") => {
                return StoreError::SerializationFailure(db_err.message().to_string())
            }
            // unique_violation
            Some("23505") => return StoreError::UniqueViolation(db_err.message().to_string()),
            _ => {}
        }
    }
    match err {
        sqlx::Error::PoolTimedOut => StoreError::LockTimeout("connection pool acquire timed out".to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

/// Value for `lock_timeout`. Never "0ms", which disables the timeout.
fn lock_timeout_setting(timeout: Duration) -> String {
    format!("{}ms", timeout.as_millis().max(1))
}

const BOOKING_COLUMNS: &str = "id, event_id, user_id, created_at";

#[async_trait]
impl SeatStore for PostgresSeatStore {
    async fn lock_event(&self, event_id: i32) -> StoreResult<Option<Box<dyn LockedEvent>>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Transaction-local equivalent of SET LOCAL lock_timeout
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(lock_timeout_setting(self.lock_timeout))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, name, total_seats FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => Ok(Some(Box::new(PgLockedEvent { tx, event: row.into() }) as Box<dyn LockedEvent>)),
            None => {
                tx.rollback().await.map_err(map_sqlx)?;
                Ok(None)
            }
        }
    }

    async fn begin_cancellation(
        &self,
        booking_id: i32,
    ) -> StoreResult<Option<Box<dyn PendingCancellation>>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "DELETE FROM bookings WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => {
                let pending = PgPendingCancellation { tx, booking: row.into() };
                Ok(Some(Box::new(pending) as Box<dyn PendingCancellation>))
            }
            None => {
                tx.rollback().await.map_err(map_sqlx)?;
                Ok(None)
            }
        }
    }

    async fn find_event(&self, event_id: i32) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT id, name, total_seats FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.map(Event::from))
    }

    async fn find_booking_details(&self, booking_id: i32) -> StoreResult<Option<BookingDetails>> {
        let row = sqlx::query_as::<_, BookingDetailsRow>(
            r#"
            SELECT b.id, b.event_id, b.user_id, b.created_at,
                   e.name AS event_name, e.total_seats
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            WHERE b.id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(|row| BookingDetails {
            event: Event { id: row.event_id, name: row.event_name, total_seats: row.total_seats },
            booking: Booking {
                id: row.id,
                event_id: row.event_id,
                user_id: row.user_id,
                created_at: row.created_at,
            },
        }))
    }

    async fn count_bookings(&self, event_id: i32) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn count_bookings_by_user(&self, user_id: &str) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}

/// Open transaction holding `SELECT ... FOR UPDATE` on one event row.
/// sqlx rolls the transaction back if this is dropped uncommitted.
struct PgLockedEvent {
    tx: Transaction<'static, Postgres>,
    event: Event,
}

#[async_trait]
impl LockedEvent for PgLockedEvent {
    fn event(&self) -> &Event {
        &self.event
    }

    async fn find_booking(&mut self, user_id: &str) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE event_id = $1 AND user_id = $2",
            BOOKING_COLUMNS
        ))
        .bind(self.event.id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Booking::from))
    }

    async fn count_bookings(&mut self) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE event_id = $1")
            .bind(self.event.id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_booking(&mut self, user_id: &str) -> StoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings (event_id, user_id) VALUES ($1, $2) RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(self.event.id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(row.into())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let event_id = self.event.id;
        self.tx.commit().await.map_err(map_sqlx)?;
        debug!(event_id, "Event lock released on commit");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}

struct PgPendingCancellation {
    tx: Transaction<'static, Postgres>,
    booking: Booking,
}

#[async_trait]
impl PendingCancellation for PgPendingCancellation {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}
