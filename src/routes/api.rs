//! Booking API routes. A known path with the wrong method falls through to `unrouted`
//! (404, or 200 for OPTIONS) instead of axum's 405.

use crate::handlers::{book, cancel, sign_in, unrouted};
use crate::state::AppState;
use axum::{
    routing::{delete, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/signin", post(sign_in).fallback(unrouted))
        .route("/api/book", post(book).fallback(unrouted))
        .route("/api/cancel", delete(cancel).fallback(unrouted))
        .with_state(state)
}
