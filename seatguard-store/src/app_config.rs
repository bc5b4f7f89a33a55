use serde::Deserialize;
use std::env;
use std::time::Duration;
use seatguard_core::retry::RetryPolicy;
use seatguard_core::EngineSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub reservation: ReservationConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub invalidation: InvalidationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationConfig {
    pub lock_timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self { lock_timeout_ms: 2000, max_attempts: 3, retry_backoff_ms: 25 }
    }
}

impl ReservationConfig {
    /// At least 1ms: Postgres reads a zero `lock_timeout` as "wait forever".
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AvailabilityConfig {
    pub cache_ttl_seconds: u64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self { cache_ttl_seconds: 60 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvalidationConfig {
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub post_commit: bool,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self { max_attempts: 3, retry_backoff_ms: 10, post_commit: true }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SEATGUARD__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SEATGUARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            reservation_retry: RetryPolicy::new(
                self.reservation.max_attempts,
                Duration::from_millis(self.reservation.retry_backoff_ms),
            ),
            invalidation_retry: RetryPolicy::new(
                self.invalidation.max_attempts,
                Duration::from_millis(self.invalidation.retry_backoff_ms),
            ),
            post_commit_invalidation: self.invalidation.post_commit,
            cache_ttl: Duration::from_secs(self.availability.cache_ttl_seconds),
        }
    }
}
