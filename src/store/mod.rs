//! Storage seam for users, bookings and occupied seats.
//! `PgStore` is the production implementation; `MemoryStore` keeps the same contract in memory.

pub mod memory;
pub mod postgres;
pub mod schema;

use crate::sql::DbError;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use schema::{ensure_database_exists, ensure_tables, SEAT_UNIQUE_CONSTRAINT};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    /// argon2 PHC string, or cleartext for rows written before hashing.
    pub password: String,
}

/// Everything needed to write one booking and its seat rows.
#[derive(Clone, Debug, PartialEq)]
pub struct NewBooking {
    pub user: String,
    pub movie: String,
    pub screening_time: String,
    pub seats_count: i32,
    pub total: f64,
    pub seat_indices: Vec<i32>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("seat already occupied for this screening")]
    SeatTaken,
    #[error("booking {0} vanished before it could be deleted")]
    BookingVanished(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Db(e.into())
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a user; returns the generated id.
    async fn create_user(&self, username: &str, password: &str) -> Result<i64, StoreError>;

    /// Insert the booking and all of its seats atomically; returns the booking id.
    async fn create_booking(&self, booking: &NewBooking) -> Result<i64, StoreError>;

    /// Delete the newest booking for (user, movie, screening time) together with its seats.
    /// Returns the deleted booking id, or `None` when nothing matched.
    async fn cancel_latest_booking(
        &self,
        user: &str,
        movie: &str,
        screening_time: &str,
    ) -> Result<Option<i64>, StoreError>;
}
