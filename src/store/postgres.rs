//! PostgreSQL-backed store. Each call holds one pooled connection; bookings and
//! cancellations run inside a transaction that is committed or rolled back before returning.

use super::{BookingStore, NewBooking, StoreError, UserRecord, SEAT_UNIQUE_CONSTRAINT};
use crate::sql::{self, DbError, JsonRow, SqlParam};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

const FIND_USER: &str = "SELECT id, username, password FROM users WHERE username = $1";
const INSERT_USER: &str = "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id";
const INSERT_BOOKING: &str = "INSERT INTO bookings (user_name, movie_title, screening_time, seats_booked, total_amount, booking_date) \
     VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING id";
const FIND_LATEST_BOOKING: &str = "SELECT id FROM bookings WHERE user_name = $1 AND movie_title = $2 AND screening_time = $3 \
     ORDER BY id DESC LIMIT 1";
const DELETE_SEATS: &str = "DELETE FROM occupied_seats WHERE booking_id_fk = $1";
const DELETE_BOOKING: &str = "DELETE FROM bookings WHERE id = $1";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_booking(conn: &mut PgConnection, booking: &NewBooking) -> Result<i64, StoreError> {
        let id = sql::insert(
            conn,
            INSERT_BOOKING,
            &[
                booking.user.as_str().into(),
                booking.movie.as_str().into(),
                booking.screening_time.as_str().into(),
                booking.seats_count.into(),
                booking.total.into(),
            ],
        )
        .await?;
        if let Some(q) = sql::insert_seats(id, &booking.movie, &booking.screening_time, &booking.seat_indices) {
            sql::execute(conn, &q.sql, &q.params).await.map_err(|e| match e {
                DbError::UniqueViolation { constraint } if constraint == SEAT_UNIQUE_CONSTRAINT => {
                    StoreError::SeatTaken
                }
                other => StoreError::Db(other),
            })?;
        }
        Ok(id)
    }

    async fn delete_latest(
        conn: &mut PgConnection,
        user: &str,
        movie: &str,
        screening_time: &str,
    ) -> Result<Option<i64>, StoreError> {
        let rows = sql::query(conn, FIND_LATEST_BOOKING, &[user.into(), movie.into(), screening_time.into()]).await?;
        let Some(id) = rows.first().and_then(|r| r.get("id")).and_then(Value::as_i64) else {
            return Ok(None);
        };
        let seats = sql::execute(conn, DELETE_SEATS, &[SqlParam::Int(id)]).await?;
        let deleted = sql::execute(conn, DELETE_BOOKING, &[SqlParam::Int(id)]).await?;
        if deleted == 0 {
            return Err(StoreError::BookingVanished(id));
        }
        tracing::debug!(booking_id = id, seats, "booking rows deleted");
        Ok(Some(id))
    }
}

/// Commit when `result` is Ok (and not a "nothing to do" `None`), roll back otherwise.
async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, StoreError>,
    keep: impl FnOnce(&T) -> bool,
) -> Result<T, StoreError> {
    match result {
        Ok(value) if keep(&value) => {
            tx.commit().await?;
            Ok(value)
        }
        Ok(value) => {
            tx.rollback().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

fn user_from_row(row: &JsonRow) -> Result<UserRecord, StoreError> {
    let text = |name: &'static str| {
        row.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(DbError::MissingColumn(name))
    };
    Ok(UserRecord {
        id: row
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(DbError::MissingColumn("id"))?,
        username: text("username")?,
        password: text("password")?,
    })
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sql::query(&mut conn, FIND_USER, &[username.into()]).await?;
        rows.first().map(user_from_row).transpose()
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sql::insert(&mut conn, INSERT_USER, &[username.into(), password.into()]).await?)
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = Self::write_booking(&mut tx, booking).await;
        finish(tx, result, |_| true).await
    }

    async fn cancel_latest_booking(
        &self,
        user: &str,
        movie: &str,
        screening_time: &str,
    ) -> Result<Option<i64>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = Self::delete_latest(&mut tx, user, movie, screening_time).await;
        finish(tx, result, Option::is_some).await
    }
}
