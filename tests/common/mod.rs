#![allow(dead_code)]

pub mod contract;

use axum_test::TestServer;
use linkstore::application::services::ShortService;
use linkstore::domain::entities::ShortRecord;
use linkstore::domain::repositories::{Backend, ShortRepository};
use linkstore::health::{HealthCheck, HealthRegistry};
use linkstore::infrastructure::persistence::MemoryStore;
use linkstore::routes::app_router;
use linkstore::state::AppState;
use std::sync::Arc;
use std::time::Duration;

pub const TTL: Duration = Duration::from_secs(300);

/// Application state over a fresh in-memory backend, with the backend and
/// the coordinator registered for health like the server does.
pub fn create_test_state() -> (AppState, Arc<MemoryStore>) {
    create_test_state_with_cache(16)
}

pub fn create_test_state_with_cache(capacity: usize) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let backend: Arc<dyn Backend> = store.clone();

    let health = Arc::new(HealthRegistry::new(None));
    health.register(store.clone() as Arc<dyn HealthCheck>);

    let shorts = Arc::new(ShortService::with_capacity(backend, capacity, TTL));
    health.register(shorts.clone());

    (AppState::new(shorts, health), store)
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(app_router(state)).unwrap()
}

/// Seeds a record straight into the backend, bypassing the cache.
pub async fn create_test_short(store: &MemoryStore, short: &str, long: &str, owner: u64) {
    store
        .put(&ShortRecord::new(short, long, owner))
        .await
        .unwrap();
}
