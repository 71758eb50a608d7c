use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use seatbook::{app, AppState, BookingStore, MemoryStore, SignInPolicy};

fn app_with(store: &Arc<MemoryStore>, policy: SignInPolicy) -> axum::Router {
    app(AppState::new(store.clone(), policy))
}

/// Send a form request and return (status, headers, JSON body).
async fn call(
    router: axum::Router,
    method: Method,
    uri: &str,
    form: &[(&str, &str)],
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let body = serde_urlencoded::to_string(form).unwrap();
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, headers, value)
}

struct Harness {
    store: Arc<MemoryStore>,
    policy: SignInPolicy,
}

impl Harness {
    fn new() -> Self {
        Harness {
            store: Arc::new(MemoryStore::new()),
            policy: SignInPolicy::default(),
        }
    }

    async fn send(&self, method: Method, uri: &str, form: &[(&str, &str)]) -> (StatusCode, Value) {
        let (status, _, body) = call(app_with(&self.store, self.policy), method, uri, form).await;
        (status, body)
    }

    async fn sign_in(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(Method::POST, "/api/signin", &[("username", username), ("password", password)])
            .await
    }

    async fn book(&self, user: &str, time: &str, seats: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/book",
            &[
                ("user", user),
                ("movie", "Dune"),
                ("screening_time", time),
                ("seats_count", "2"),
                ("total", "25.00"),
                ("seats_indices", seats),
            ],
        )
        .await
    }

    async fn cancel(&self, user: &str, time: &str) -> (StatusCode, Value) {
        self.send(
            Method::DELETE,
            "/api/cancel",
            &[("user", user), ("movie", "Dune"), ("time", time)],
        )
        .await
    }
}

const TIME: &str = "2024-01-01T20:00";

#[tokio::test]
async fn first_sign_in_registers_user() {
    let h = Harness::new();
    let (status, body) = h.sign_in("alice", "pw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "New user created and signed in successfully.");
    assert!(body["user_id"].as_i64().is_some());
    assert_eq!(h.store.users().len(), 1);
}

#[tokio::test]
async fn repeated_sign_in_with_same_password_creates_nothing() {
    let h = Harness::new();
    h.sign_in("alice", "pw").await;
    let (status, body) = h.sign_in("alice", "pw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "Sign-in successful."}));
    assert_eq!(h.store.users().len(), 1);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = Harness::new();
    h.sign_in("alice", "pw").await;
    let (status, body) = h.sign_in("alice", "other").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"status": "error", "message": "Invalid username or password."}));
    assert_eq!(h.store.users().len(), 1);
}

#[tokio::test]
async fn sign_in_requires_both_fields() {
    let h = Harness::new();
    let (status, body) = h.sign_in("alice", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username and password are required.");
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn unknown_user_rejected_when_registration_disabled() {
    let mut h = Harness::new();
    h.policy = SignInPolicy { auto_register: false };
    let (status, _) = h.sign_in("mallory", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.store.users().is_empty());
}

#[tokio::test]
async fn booking_saves_booking_and_seats() {
    let h = Harness::new();
    let (status, body) = h.book("alice", TIME, "[3,4]").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Booking saved.");
    let id = body["booking_id"].as_i64().unwrap();

    let bookings = h.store.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, id);
    assert_eq!(bookings[0].seats_booked, 2);
    assert_eq!(bookings[0].total_amount, 25.0);

    let mut seats: Vec<i32> = h.store.seats().iter().map(|s| s.seat_index).collect();
    seats.sort_unstable();
    assert_eq!(seats, vec![3, 4]);
    assert!(h.store.seats().iter().all(|s| s.booking_id_fk == id && s.screening_time == TIME));
}

#[tokio::test]
async fn booking_without_seats_writes_only_the_booking() {
    let h = Harness::new();
    let (status, _) = h.book("alice", TIME, "[]").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.store.bookings().len(), 1);
    assert!(h.store.seats().is_empty());
}

#[tokio::test]
async fn failed_seat_insert_leaves_nothing_behind() {
    let h = Harness::new();
    h.store.fail_seat_inserts(true);
    let (status, body) = h.book("alice", TIME, "[3,4]").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Booking failed."}));
    assert!(h.store.bookings().is_empty());
    assert!(h.store.seats().is_empty());
}

#[tokio::test]
async fn occupied_seat_conflicts() {
    let h = Harness::new();
    h.book("alice", TIME, "[3,4]").await;
    let (status, body) = h.book("bob", TIME, "[4,5]").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(h.store.bookings().len(), 1);
    assert_eq!(h.store.seats().len(), 2);

    let (status, _) = h.book("bob", "2024-01-02T20:00", "[4,5]").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_seat_indices_is_rejected_before_storage() {
    let h = Harness::new();
    let (status, body) = h.book("alice", TIME, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "Invalid seats_indices format."}));
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn booking_requires_screening_time() {
    let h = Harness::new();
    let (status, body) = h.book("alice", "", "[1]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Screening time is required for booking.");
}

#[tokio::test]
async fn cancel_removes_latest_booking_then_404s() {
    let h = Harness::new();
    let (_, first) = h.book("alice", TIME, "[1]").await;
    let (_, second) = h.book("alice", TIME, "[2,3]").await;

    let (status, body) = h.cancel("alice", TIME).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "Booking successfully cancelled."}));
    let remaining: Vec<i64> = h.store.bookings().iter().map(|b| b.id).collect();
    assert_eq!(remaining, vec![first["booking_id"].as_i64().unwrap()]);
    assert!(h
        .store
        .seats()
        .iter()
        .all(|s| Some(s.booking_id_fk) != second["booking_id"].as_i64()));

    h.cancel("alice", TIME).await;
    let (status, body) = h.cancel("alice", TIME).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No recent booking found to cancel with that movie and time.");
    assert!(h.store.seats().is_empty());
}

#[tokio::test]
async fn cancel_requires_all_fields() {
    let h = Harness::new();
    let (status, body) = h
        .send(Method::DELETE, "/api/cancel", &[("user", "alice"), ("movie", "Dune")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing user, movie, or time details for cancellation.");
}

#[tokio::test]
async fn options_preflight_on_any_path() {
    let store = Arc::new(MemoryStore::new());
    for uri in ["/api/book", "/api/cancel", "/anything/else"] {
        let (status, headers, body) =
            call(app_with(&store, SignInPolicy::default()), Method::OPTIONS, uri, &[]).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({}));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, GET, DELETE, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn unknown_routes_and_wrong_methods_are_404() {
    let h = Harness::new();
    for (method, uri) in [
        (Method::GET, "/api/signin"),
        (Method::GET, "/api/book"),
        (Method::POST, "/api/cancel"),
        (Method::DELETE, "/api/book"),
        (Method::POST, "/nope"),
        (Method::PUT, "/api/book"),
    ] {
        let (status, headers, body) =
            call(app_with(&h.store, h.policy), method.clone(), uri, &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body, json!({"status": "error", "message": "Endpoint Not Found"}));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn get_is_never_routed() {
    let h = Harness::new();
    for uri in ["/", "/health", "/ready", "/version", "/api"] {
        let (status, body) = h.send(Method::GET, uri, &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({"status": "error", "message": "Endpoint Not Found"}));
    }
}

fn too_large_body() -> Value {
    json!({"status": "error", "message": "Request body too large."})
}

#[tokio::test]
async fn oversized_body_is_refused_as_json() {
    let h = Harness::new();
    let huge = "x".repeat(seatbook::routes::BODY_LIMIT_BYTES + 1);
    let (status, headers, body) = call(
        app_with(&h.store, h.policy),
        Method::POST,
        "/api/signin",
        &[("username", "alice"), ("password", &huge)],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body, too_large_body());
    assert!(h.store.users().is_empty());
}

#[tokio::test]
async fn oversized_body_without_length_is_refused_as_json() {
    let h = Harness::new();
    let body = format!(
        "user=alice&movie=Dune&screening_time=t&seats_indices=[]&pad={}",
        "x".repeat(seatbook::routes::BODY_LIMIT_BYTES)
    );
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/book")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let resp = app_with(&h.store, h.policy).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, too_large_body());
    assert!(h.store.bookings().is_empty());
}

#[tokio::test]
async fn corrupt_stored_hash_is_a_server_error() {
    let h = Harness::new();
    h.store
        .create_user("carol", "$argon2id$v=x$m=19456,t=2,p=1$!!!!$!!!!")
        .await
        .unwrap();
    let (status, body) = h.sign_in("carol", "pw").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Server error during authentication/registration."})
    );
}

#[tokio::test]
async fn cancel_that_deletes_nothing_rolls_back() {
    let h = Harness::new();
    h.book("alice", TIME, "[1,2]").await;
    h.store.skip_booking_deletes(true);
    let (status, body) = h.cancel("alice", TIME).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Cancellation failed due to server error."})
    );
    assert_eq!(h.store.bookings().len(), 1);
    assert_eq!(h.store.seats().len(), 2);
}

#[tokio::test]
async fn scalar_seat_indices_books_no_seats() {
    let h = Harness::new();
    let (status, body) = h.book("alice", TIME, "5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["booking_id"].as_i64().is_some());
    assert_eq!(h.store.bookings().len(), 1);
    assert!(h.store.seats().is_empty());
}
