//! Storage backend implementations.
//!
//! Every backend implements the full [`Backend`] contract. [`open`] is the only
//! place that knows which concrete type is in use.
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local maps, for development and tests
//! - [`LmdbStore`] - embedded ordered key-value store (LMDB via heed)
//! - [`CqlStore`] - distributed column store (Scylla/Cassandra)
//! - [`PgStore`] - PostgreSQL

mod codec;
pub mod cql_store;
pub mod lmdb_store;
pub mod memory_store;
pub mod pg_store;

pub use cql_store::CqlStore;
pub use lmdb_store::LmdbStore;
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;

use std::sync::Arc;
use tracing::info;

use crate::config::{BackendKind, StorageConfig};
use crate::domain::repositories::Backend;
use crate::error::{StoreError, StoreResult};
use crate::health::{HealthCheck, HealthRegistry};

/// Opens the configured backend and registers it with `health`.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] if the backend cannot be reached or is
/// missing required settings.
pub async fn open(config: &StorageConfig, health: &HealthRegistry) -> StoreResult<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Memory => register(health, MemoryStore::new()),
        BackendKind::Lmdb => register(
            health,
            LmdbStore::open(&config.lmdb_path, config.lmdb_map_size_mb)?,
        ),
        BackendKind::Cql => register(
            health,
            CqlStore::connect(&config.cql_hosts, &config.cql_keyspace).await?,
        ),
        BackendKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::backend("no database URL configured"))?;
            register(health, PgStore::connect(url, config.db_max_connections).await?)
        }
    };

    info!(backend = %config.backend, "Storage backend ready");
    Ok(backend)
}

fn register<B: Backend + 'static>(health: &HealthRegistry, store: B) -> Arc<dyn Backend> {
    let store = Arc::new(store);
    health.register(store.clone() as Arc<dyn HealthCheck>);
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn storage(backend: BackendKind) -> StorageConfig {
        StorageConfig {
            backend,
            lmdb_path: PathBuf::new(),
            lmdb_map_size_mb: 10,
            cql_hosts: Vec::new(),
            cql_keyspace: "linkstore".to_string(),
            database_url: None,
            db_max_connections: 1,
        }
    }

    #[tokio::test]
    async fn test_open_registers_backend() {
        let health = HealthRegistry::default();
        let backend = open(&storage(BackendKind::Memory), &health).await.unwrap();

        assert_eq!(health.components(), vec!["memory"]);
        assert_eq!(backend.name(), "memory");
        assert!(health.check_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_open_lmdb() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = storage(BackendKind::Lmdb);
        config.lmdb_path = temp_dir.path().join("db");

        let health = HealthRegistry::default();
        open(&config, &health).await.unwrap();
        assert_eq!(health.components(), vec!["lmdb"]);
    }

    #[tokio::test]
    async fn test_open_postgres_without_url_fails() {
        let health = HealthRegistry::default();
        let result = open(&storage(BackendKind::Postgres), &health).await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(health.components().is_empty());
    }
}
