//! # linkstore
//!
//! Short-alias to URL redirect service with ownership-checked writes,
//! interchangeable storage backends and an in-process read-through cache.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Records and the storage contract
//! - **Application Layer** ([`application`]) - Read-through coordinator and user service
//! - **Infrastructure Layer** ([`infrastructure`]) - Storage backends and the cache engine
//! - **API Layer** ([`api`]) - HTTP handlers, DTOs and extractors
//! - **Health** ([`health`]) - Ordered, deadline-bounded component checks
//!
//! ## Storage Backends
//!
//! Exactly one backend is selected at startup with `STORAGE_BACKEND`:
//!
//! - `memory` - process-local maps
//! - `lmdb` - embedded ordered key-value store
//! - `cql` - Scylla or Cassandra, using lightweight transactions
//! - `postgres` - PostgreSQL, using row locks
//!
//! All of them refuse to let one user overwrite or delete another user's alias.
//!
//! ## Quick Start
//!
//! ```bash
//! export STORAGE_BACKEND=lmdb
//! export LMDB_PATH=./data
//! cargo run
//!
//! curl -X POST localhost:8080/create -H 'X-Owner-Id: 7' \
//!      -d '{"Short":"miserable","Long":"pigeon.example"}'
//! curl -i localhost:8080/miserable
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod health;
pub mod infrastructure;
pub mod state;
pub mod telemetry;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::{AppError, StoreError, StoreResult};
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{CachedUrl, ShortService, UserService};
    pub use crate::domain::entities::{ShortRecord, UserRecord};
    pub use crate::domain::repositories::{Backend, ShortRepository, UserRepository};
    pub use crate::error::{AppError, StoreError, StoreResult};
    pub use crate::health::{HealthCheck, HealthRegistry};
    pub use crate::infrastructure::cache::{HeapCache, KvCache};
    pub use crate::state::AppState;
}
