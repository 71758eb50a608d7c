//! Route table and the middleware stack shared by every response.

pub mod api;

pub use api::api_routes;

use crate::error::{AppError, MSG_BODY_TOO_LARGE};
use crate::handlers::unrouted;
use crate::response::cors_header_values;
use crate::state::AppState;
use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Full application: API routes, JSON 404 fallback, body limit, CORS headers on every
/// response and request tracing.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api_routes(state))
        .fallback(unrouted)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(middleware::map_response(json_limit_response));

    // Outside the body limit so a 413 carries them too.
    for (name, value) in cors_header_values() {
        router = router.layer(SetResponseHeaderLayer::overriding(name, value));
    }

    router.layer(TraceLayer::new_for_http())
}

/// The limit layer refuses a too-long `Content-Length` with a plain-text 413 before any
/// handler runs; give it the same JSON envelope as every other error.
async fn json_limit_response(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::TooLarge(MSG_BODY_TOO_LARGE.into()).into_response();
    }
    response
}
