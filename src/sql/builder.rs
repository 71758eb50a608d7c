//! Builds the statements whose shape depends on input: the multi-row seat insert.

use super::params::SqlParam;

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new(sql: impl Into<String>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: impl Into<SqlParam>) -> usize {
        self.params.push(v.into());
        self.params.len()
    }
}

/// One `INSERT` covering every seat of a booking. Booking id, movie and screening time
/// are bound once ($1..$3) and shared by every row. `None` when there are no seats.
pub fn insert_seats(
    booking_id: i64,
    movie: &str,
    screening_time: &str,
    seats: &[i32],
) -> Option<QueryBuf> {
    if seats.is_empty() {
        return None;
    }
    let mut q = QueryBuf::new(
        "INSERT INTO occupied_seats (booking_id_fk, movie_title, screening_time, seat_index) VALUES ",
    );
    let id = q.push_param(booking_id);
    let movie = q.push_param(movie);
    let time = q.push_param(screening_time);
    let rows: Vec<String> = seats
        .iter()
        .map(|&seat| {
            let n = q.push_param(seat);
            format!("(${}, ${}, ${}, ${})", id, movie, time, n)
        })
        .collect();
    q.sql.push_str(&rows.join(", "));
    Some(q)
}
