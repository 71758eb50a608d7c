//! Form field validation for booking and cancellation requests. Runs before any store access.

use crate::error::AppError;
use crate::extractors::FormFields;
use crate::store::NewBooking;
use serde_json::Value;

pub const MSG_SCREENING_REQUIRED: &str = "Screening time is required for booking.";
pub const MSG_BAD_SEATS: &str = "Invalid seats_indices format.";
pub const MSG_BOOKING_PARTIES: &str = "User and movie are required for booking.";
pub const MSG_BAD_AMOUNTS: &str = "Invalid seats_count or total.";
pub const MSG_CANCEL_FIELDS: &str = "Missing user, movie, or time details for cancellation.";

/// (user, movie, screening time) identifying the booking to cancel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelRequest {
    pub user: String,
    pub movie: String,
    pub time: String,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Check order: screening time, seat list, user/movie, then the numeric fields.
    pub fn booking(form: &FormFields) -> Result<NewBooking, AppError> {
        let screening_time = form
            .get("screening_time")
            .ok_or_else(|| AppError::validation(MSG_SCREENING_REQUIRED))?;
        let seat_indices = parse_seat_indices(form.get("seats_indices"))?;
        let (Some(user), Some(movie)) = (form.get("user"), form.get("movie")) else {
            return Err(AppError::validation(MSG_BOOKING_PARTIES));
        };
        let seats_count = match form.get("seats_count") {
            None => i32::try_from(seat_indices.len()).map_err(|_| AppError::validation(MSG_BAD_AMOUNTS))?,
            Some(s) => s.trim().parse().map_err(|_| AppError::validation(MSG_BAD_AMOUNTS))?,
        };
        let total = match form.get("total") {
            None => 0.0,
            Some(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| AppError::validation(MSG_BAD_AMOUNTS))?,
        };
        Ok(NewBooking {
            user: user.to_string(),
            movie: movie.to_string(),
            screening_time: screening_time.to_string(),
            seats_count,
            total,
            seat_indices,
        })
    }

    pub fn cancellation(form: &FormFields) -> Result<CancelRequest, AppError> {
        match (form.get("user"), form.get("movie"), form.get("time")) {
            (Some(user), Some(movie), Some(time)) => Ok(CancelRequest {
                user: user.to_string(),
                movie: movie.to_string(),
                time: time.to_string(),
            }),
            _ => Err(AppError::validation(MSG_CANCEL_FIELDS)),
        }
    }
}

/// `seats_indices` is a JSON array sent as a form string. Any valid JSON that is not an
/// array (`null`, `5`, `{}`) books no seats; an array element that is not integer-like is
/// rejected.
pub fn parse_seat_indices(raw: Option<&str>) -> Result<Vec<i32>, AppError> {
    let bad = || AppError::validation(MSG_BAD_SEATS);
    let value: Value = serde_json::from_str(raw.ok_or_else(bad)?).map_err(|_| bad())?;
    match value {
        Value::Array(items) => items.iter().map(|v| coerce_seat_index(v).ok_or_else(bad)).collect(),
        _ => Ok(Vec::new()),
    }
}

/// Integer coercion: integral numbers as-is, fractional numbers truncated,
/// strings by their leading integer (`"12abc"` is 12).
fn coerce_seat_index(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n
                .as_f64()
                .map(f64::trunc)
                .filter(|f| *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX))
                .map(|f| f as i32),
        },
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}
