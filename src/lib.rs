//! seatbook: cinema seat booking backend (sign-in, booking, cancellation) on PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use error::{AppError, ConfigError};
pub use response::{send, Envelope};
pub use routes::{api_routes, app};
pub use service::{find_or_create_user, SignInPolicy};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, BookingStore, MemoryStore, PgStore};
