//! Response envelope `{status, message, ...}` and the headers every response carries.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::Json;
use serde::Serialize;

/// Cross-origin headers attached to every response, errors and 404s included.
pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, DELETE, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

pub fn cors_header_values() -> impl Iterator<Item = (HeaderName, HeaderValue)> {
    CORS_HEADERS
        .into_iter()
        .map(|(name, value)| (name, HeaderValue::from_static(value)))
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Envelope {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<i64>,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message.into())
    }

    pub fn with_user_id(mut self, id: i64) -> Self {
        self.user_id = Some(id);
        self
    }

    pub fn with_booking_id(mut self, id: i64) -> Self {
        self.booking_id = Some(id);
        self
    }

    fn new(status: Status, message: String) -> Self {
        Envelope {
            status,
            message,
            user_id: None,
            booking_id: None,
        }
    }
}

/// Status plus JSON body; `Json` sets `Content-Type: application/json`.
pub fn send<T: Serialize>(status: StatusCode, payload: T) -> (StatusCode, Json<T>) {
    (status, Json(payload))
}

pub fn success(message: impl Into<String>) -> (StatusCode, Json<Envelope>) {
    send(StatusCode::OK, Envelope::success(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_ids_are_omitted() {
        let body = serde_json::to_value(Envelope::success("Sign-in successful.")).unwrap();
        assert_eq!(body, json!({"status": "success", "message": "Sign-in successful."}));
    }

    #[test]
    fn booking_id_is_included_when_set() {
        let body = serde_json::to_value(Envelope::success("Booking saved.").with_booking_id(9)).unwrap();
        assert_eq!(body["booking_id"], 9);
        assert_eq!(body["status"], "success");
    }

    #[test]
    fn error_envelope_status() {
        let body = serde_json::to_value(Envelope::error("Endpoint Not Found")).unwrap();
        assert_eq!(body, json!({"status": "error", "message": "Endpoint Not Found"}));
    }
}
