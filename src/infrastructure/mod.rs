//! Infrastructure layer for storage and caching.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete storage backends and the in-process cache engine.
//!
//! # Modules
//!
//! - [`cache`] - Bounded recency cache with heap-ordered eviction
//! - [`persistence`] - Storage backends and backend selection

pub mod cache;
pub mod persistence;
