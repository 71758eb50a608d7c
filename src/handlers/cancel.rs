//! DELETE /api/cancel

use crate::error::AppError;
use crate::extractors::FormFields;
use crate::response::success;
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn cancel(
    State(state): State<AppState>,
    form: FormFields,
) -> Result<impl IntoResponse, AppError> {
    let req = RequestValidator::cancellation(&form)?;

    let cancelled = state
        .store
        .cancel_latest_booking(&req.user, &req.movie, &req.time)
        .await
        .map_err(|e| AppError::internal("Cancellation failed due to server error.", e))?;

    match cancelled {
        Some(booking_id) => {
            tracing::info!(booking_id, movie = %req.movie, "booking cancelled");
            Ok(success("Booking successfully cancelled."))
        }
        None => Err(AppError::NotFound(
            "No recent booking found to cancel with that movie and time.".into(),
        )),
    }
}
