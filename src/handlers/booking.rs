//! POST /api/book

use crate::error::AppError;
use crate::extractors::FormFields;
use crate::response::{send, Envelope};
use crate::service::RequestValidator;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

pub async fn book(
    State(state): State<AppState>,
    form: FormFields,
) -> Result<impl IntoResponse, AppError> {
    let booking = RequestValidator::booking(&form)?;

    let booking_id = state.store.create_booking(&booking).await.map_err(|e| match e {
        StoreError::SeatTaken => {
            AppError::Conflict("One or more selected seats are already booked.".into())
        }
        other => AppError::internal("Booking failed.", other),
    })?;

    tracing::info!(
        booking_id,
        movie = %booking.movie,
        screening_time = %booking.screening_time,
        seats = booking.seat_indices.len(),
        "booking saved"
    );
    Ok(send(
        StatusCode::OK,
        Envelope::success("Booking saved.").with_booking_id(booking_id),
    ))
}
