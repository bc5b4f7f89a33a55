use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use seatguard_api::{app, shutdown::shutdown_signal, AppState};
use seatguard_core::BookingService;
use seatguard_store::{app_config::Config, DbClient, PostgresSeatStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatguard_api=debug,seatguard_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Seatguard API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Database connected successfully");

    let redis = RedisClient::new(&config.redis.url)
        .await
        .context("Failed to create Redis client")?;
    redis.ping().await.context("Failed to connect to Redis")?;
    tracing::info!("Redis connected successfully");

    let store = PostgresSeatStore::new(db.pool.clone(), config.reservation.lock_timeout());
    let bookings = BookingService::new(Arc::new(store), Arc::new(redis), config.engine_settings());

    let app_state = AppState { bookings: Arc::new(bookings) };
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    db.close().await;
    Ok(())
}
