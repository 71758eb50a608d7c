//! Database gateway: parameterized statements on one connection, rows decoded to JSON objects.
//! Callers pass a pooled connection or an open transaction (both deref to `PgConnection`).

use super::params::SqlParam;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgConnection, Postgres, Row};
use thiserror::Error;

/// One decoded result row, keyed by column name.
pub type JsonRow = Map<String, Value>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },
    #[error("statement returned no '{0}' column")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return DbError::UniqueViolation {
                    constraint: db.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        DbError::Sqlx(e)
    }
}

fn bind_all<'q>(sql: &'q str, params: &[SqlParam]) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |q, p| q.bind(p.clone()))
}

/// Run a statement and return every row it produced.
pub async fn query(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<JsonRow>, DbError> {
    tracing::debug!(sql = %sql, params = params.len(), "query");
    let rows = bind_all(sql, params).fetch_all(&mut *conn).await?;
    Ok(rows.iter().map(row_to_json).collect())
}

/// Run an `INSERT ... RETURNING id` and return the generated id.
pub async fn insert(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<i64, DbError> {
    let rows = query(conn, sql, params).await?;
    rows.first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_i64)
        .ok_or(DbError::MissingColumn("id"))
}

/// Run a statement for its side effect; returns the number of affected rows.
pub async fn execute(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<u64, DbError> {
    tracing::debug!(sql = %sql, params = params.len(), "execute");
    let done = bind_all(sql, params).execute(&mut *conn).await?;
    Ok(done.rows_affected())
}

fn row_to_json(row: &PgRow) -> JsonRow {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), cell_to_value(row, col.ordinal())))
        .collect()
}

fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(idx) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    Value::Null
}
