#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use seatguard_core::retry::RetryPolicy;
use seatguard_core::{BookingService, EngineSettings};
use seatguard_store::{MemoryCache, MemorySeatStore};

pub struct Harness {
    pub store: Arc<MemorySeatStore>,
    pub cache: Arc<MemoryCache>,
    pub service: Arc<BookingService>,
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        reservation_retry: RetryPolicy::new(2, Duration::from_millis(1)),
        invalidation_retry: RetryPolicy::new(2, Duration::from_millis(1)),
        ..EngineSettings::default()
    }
}

pub fn harness() -> Harness {
    harness_with(Duration::from_secs(2), settings())
}

pub fn harness_with(lock_timeout: Duration, settings: EngineSettings) -> Harness {
    let store = Arc::new(MemorySeatStore::new(lock_timeout));
    let cache = Arc::new(MemoryCache::new());
    let service = Arc::new(BookingService::new(store.clone(), cache.clone(), settings));
    Harness { store, cache, service }
}
