//! Requests no route accepts: OPTIONS preflight gets `200 {}`, everything else a JSON 404.
//! Neither path reads the body or touches the store.

use crate::response::{send, Envelope};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

pub async fn unrouted(method: Method) -> Response {
    if method == Method::OPTIONS {
        return send(StatusCode::OK, serde_json::json!({})).into_response();
    }
    send(StatusCode::NOT_FOUND, Envelope::error("Endpoint Not Found")).into_response()
}
