//! Cache trait shared by the read-through coordinator and the engine.

use crate::error::StoreResult;

/// A synchronous key-value cache with bounded capacity.
///
/// Implementations must be internally synchronized: every method takes
/// `&self` and may be called from any number of request tasks at once.
/// No method performs I/O, so calling them from async code is fine.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::HeapCache`] - recency eviction over a binary min-heap
pub trait KvCache<V>: Send + Sync {
    /// Inserts or replaces `value` under `key` and marks the key as just used.
    ///
    /// Returns the previous value if the key was already present.
    fn put(&self, key: &str, value: V) -> Option<V>;

    /// Returns a copy of the value under `key` and marks the key as just used.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::NotFound`] on a miss. A miss never
    /// changes cache state.
    fn get(&self, key: &str) -> StoreResult<V>;

    /// Removes `key` regardless of how recently it was used.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::NotFound`] if the key is absent.
    fn invalidate(&self, key: &str) -> StoreResult<V>;

    /// Reports whether the cache can still be trusted.
    fn is_healthy(&self) -> bool;
}
