//! Repository trait definitions for the domain layer.
//!
//! These traits are the storage contract. Concrete backends live in
//! `crate::infrastructure::persistence`; exactly one of them is chosen at
//! startup and shared by every request as an `Arc<dyn Backend>`.
//!
//! # Available Repositories
//!
//! - [`ShortRepository`] - ownership-checked short alias storage
//! - [`UserRepository`] - idempotent user creation and lookup
//!
//! # Testing
//!
//! Mock implementations are generated via `mockall` under `cfg(test)`. The
//! shared behavioural contract is exercised in `tests/storage_contract.rs`.

pub mod short_repository;
pub mod user_repository;

pub use short_repository::{ShortRepository, key_in_range, range_is_empty};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use short_repository::MockShortRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;

use crate::health::HealthCheck;

/// A complete storage backend: shorts, users and a health check.
pub trait Backend: ShortRepository + UserRepository + HealthCheck {}

impl<T: ShortRepository + UserRepository + HealthCheck + ?Sized> Backend for T {}
