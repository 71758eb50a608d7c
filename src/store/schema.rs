//! Table DDL and database bootstrap. Every statement is idempotent so it runs on each start.

use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Name of the constraint that keeps one seat per screening.
pub const SEAT_UNIQUE_CONSTRAINT: &str = "occupied_seats_screening_seat_key";

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id BIGSERIAL PRIMARY KEY,
        user_name TEXT NOT NULL,
        movie_title TEXT NOT NULL,
        screening_time TEXT NOT NULL,
        seats_booked INTEGER NOT NULL,
        total_amount DOUBLE PRECISION NOT NULL,
        booking_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS occupied_seats (
        id BIGSERIAL PRIMARY KEY,
        booking_id_fk BIGINT NOT NULL,
        movie_title TEXT NOT NULL,
        screening_time TEXT NOT NULL,
        seat_index INTEGER NOT NULL,
        CONSTRAINT occupied_seats_screening_seat_key UNIQUE (movie_title, screening_time, seat_index)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS bookings_screening_idx ON bookings (user_name, movie_title, screening_time)",
    "CREATE INDEX IF NOT EXISTS occupied_seats_booking_idx ON occupied_seats (booking_id_fk)",
];

/// Create `users`, `bookings` and `occupied_seats` if they do not exist.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("schema ready");
    Ok(())
}

/// Connect to the `postgres` maintenance database and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    let (admin_url, db_name) = split_db_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// `(admin url, database name)`. The admin url keeps the query string so it connects with
/// the same TLS and other options as the pool.
fn split_db_name(url: &str) -> Result<(String, String), sqlx::Error> {
    let (head, query) = match url.split_once('?') {
        Some((head, query)) => (head, Some(query)),
        None => (url, None),
    };
    let path_start = head
        .rfind('/')
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL has no database path".into()))?
        + 1;
    let db_name = head.get(path_start..).unwrap_or("").trim();
    let base = head.get(..path_start).unwrap_or(head);
    let admin = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Ok((admin, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
