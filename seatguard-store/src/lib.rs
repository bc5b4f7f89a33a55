pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod redis_repo;
pub mod memory;

pub use database::DbClient;
pub use booking_repo::PostgresSeatStore;
pub use redis_repo::RedisClient;
pub use memory::{MemoryCache, MemorySeatStore};
