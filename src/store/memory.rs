//! In-memory store with the same contract as `PgStore`: seat uniqueness per screening,
//! all-or-nothing bookings, newest-first cancellation. A test double for the handlers,
//! with hooks to inject failures inside its transactions.

use super::{BookingStore, NewBooking, StoreError, UserRecord};
use crate::sql::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub struct BookingRow {
    pub id: i64,
    pub user_name: String,
    pub movie_title: String,
    pub screening_time: String,
    pub seats_booked: i32,
    pub total_amount: f64,
    pub booking_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatRow {
    pub booking_id_fk: i64,
    pub movie_title: String,
    pub screening_time: String,
    pub seat_index: i32,
}

#[derive(Clone, Default)]
struct Tables {
    users: Vec<UserRecord>,
    bookings: Vec<BookingRow>,
    seats: Vec<SeatRow>,
    next_user_id: i64,
    next_booking_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_seat_inserts: AtomicBool,
    skip_booking_deletes: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.lock().users.clone()
    }

    pub fn bookings(&self) -> Vec<BookingRow> {
        self.lock().bookings.clone()
    }

    pub fn seats(&self) -> Vec<SeatRow> {
        self.lock().seats.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> MutexGuard<'_, Tables> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lock()
    }

    /// Run `work` as one transaction: on error every table goes back to its state before
    /// the call. Sequence values handed out meanwhile are not given back.
    fn transaction<T>(
        &self,
        work: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut t = self.enter();
        let before = (*t).clone();
        let result = work(&mut *t);
        if result.is_err() {
            let next_booking_id = t.next_booking_id;
            *t = before;
            t.next_booking_id = next_booking_id;
        }
        result
    }

    fn write_booking(&self, t: &mut Tables, booking: &NewBooking) -> Result<i64, StoreError> {
        t.next_booking_id += 1;
        let id = t.next_booking_id;
        t.bookings.push(BookingRow {
            id,
            user_name: booking.user.clone(),
            movie_title: booking.movie.clone(),
            screening_time: booking.screening_time.clone(),
            seats_booked: booking.seats_count,
            total_amount: booking.total,
            booking_date: Utc::now(),
        });
        if booking.seat_indices.is_empty() {
            return Ok(id);
        }
        if self.fail_seat_inserts.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::Protocol("injected seat insert failure".into())).into());
        }
        for &seat in &booking.seat_indices {
            if t.seat_taken(&booking.movie, &booking.screening_time, seat) {
                return Err(StoreError::SeatTaken);
            }
            t.seats.push(SeatRow {
                booking_id_fk: id,
                movie_title: booking.movie.clone(),
                screening_time: booking.screening_time.clone(),
                seat_index: seat,
            });
        }
        Ok(id)
    }

    fn delete_latest(
        &self,
        t: &mut Tables,
        user: &str,
        movie: &str,
        screening_time: &str,
    ) -> Result<Option<i64>, StoreError> {
        let Some(id) = t
            .bookings
            .iter()
            .filter(|b| b.user_name == user && b.movie_title == movie && b.screening_time == screening_time)
            .map(|b| b.id)
            .max()
        else {
            return Ok(None);
        };
        t.seats.retain(|s| s.booking_id_fk != id);
        let before = t.bookings.len();
        if !self.skip_booking_deletes.load(Ordering::SeqCst) {
            t.bookings.retain(|b| b.id != id);
        }
        if t.bookings.len() == before {
            return Err(StoreError::BookingVanished(id));
        }
        Ok(Some(id))
    }
}

/// Fault injection and call accounting for tests.
#[doc(hidden)]
impl MemoryStore {
    /// Make seat inserts fail after the booking row was written, to exercise rollback.
    pub fn fail_seat_inserts(&self, fail: bool) {
        self.fail_seat_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make the booking delete affect no rows, as if another request removed it first.
    pub fn skip_booking_deletes(&self, skip: bool) {
        self.skip_booking_deletes.store(skip, Ordering::SeqCst);
    }

    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Tables {
    fn seat_taken(&self, movie: &str, screening_time: &str, seat: i32) -> bool {
        self.seats
            .iter()
            .any(|s| s.seat_index == seat && s.movie_title == movie && s.screening_time == screening_time)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.enter().users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<i64, StoreError> {
        let mut t = self.enter();
        if t.users.iter().any(|u| u.username == username) {
            return Err(DbError::UniqueViolation {
                constraint: "users_username_key".into(),
            }
            .into());
        }
        t.next_user_id += 1;
        let id = t.next_user_id;
        t.users.push(UserRecord {
            id,
            username: username.to_string(),
            password: password.to_string(),
        });
        Ok(id)
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<i64, StoreError> {
        self.transaction(|t| self.write_booking(t, booking))
    }

    async fn cancel_latest_booking(
        &self,
        user: &str,
        movie: &str,
        screening_time: &str,
    ) -> Result<Option<i64>, StoreError> {
        self.transaction(|t| self.delete_latest(t, user, movie, screening_time))
    }
}
