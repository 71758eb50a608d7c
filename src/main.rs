//! seatbook server: loads `.env`, prepares the database, mounts the routes and serves.

use seatbook::{app, ensure_database_exists, ensure_tables, AppState, PgStore, ServerConfig, SignInPolicy};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seatbook=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.create_database {
        ensure_database_exists(&config.database_url).await?;
    }
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;
    ensure_tables(&pool).await?;

    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        SignInPolicy {
            auto_register: config.auto_register,
        },
    );

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        auto_register = config.auto_register,
        "listening on http://{}; endpoints: POST /api/signin, POST /api/book, DELETE /api/cancel",
        listener.local_addr()?
    );
    axum::serve(listener, app(state)).await?;
    Ok(())
}
