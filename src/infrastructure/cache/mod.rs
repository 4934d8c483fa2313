//! In-process caching for fast redirect lookups.
//!
//! Provides a [`KvCache`] trait and its one engine:
//! - [`HeapCache`] - fixed-capacity cache evicting the least recently touched entry
//!
//! Disabling the cache is a coordinator concern: with a capacity of zero no
//! cache is built at all and every read goes to storage.

mod heap_cache;
mod service;

pub use heap_cache::HeapCache;
pub use service::KvCache;
