//! Repository trait for short alias records.

use crate::domain::entities::ShortRecord;
use crate::error::StoreResult;
use async_trait::async_trait;

/// Ownership-checked key-value store for [`ShortRecord`]s.
///
/// Every backend must give the same observable results for the same sequence
/// of calls, whatever its native concurrency primitive. Writes for one key are
/// linearizable: an ownership check and the mutation it guards are never
/// interleaved with another write to that key.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryStore`] - process-local maps
/// - [`crate::infrastructure::persistence::LmdbStore`] - embedded ordered KV store (LMDB)
/// - [`crate::infrastructure::persistence::CqlStore`] - Cassandra/Scylla lightweight transactions
/// - [`crate::infrastructure::persistence::PgStore`] - PostgreSQL row transactions
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/storage_contract.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortRepository: Send + Sync {
    /// Creates or replaces the record for `record.short`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::PermissionDenied`] if the key is
    /// held by another owner; nothing is written in that case.
    ///
    /// Returns [`crate::error::StoreError::Ambiguous`] if a conditional insert
    /// lost a race and the backend cannot tell who won.
    async fn put(&self, record: &ShortRecord) -> StoreResult<()>;

    /// Fetches the record for `short`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::NotFound`] if absent.
    async fn get(&self, short: &str) -> StoreResult<ShortRecord>;

    /// Removes the record for `short` if `owner` holds it.
    ///
    /// Deleting an absent key succeeds, except on backends that cannot tell
    /// "absent" from "held by someone else"; those return
    /// [`crate::error::StoreError::PermissionDenied`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::PermissionDenied`] on owner mismatch.
    async fn delete(&self, short: &str, owner: u64) -> StoreResult<()>;

    /// Lists records whose key lies in `[start, end]`.
    ///
    /// An empty bound leaves that side open. Ordering is backend specific.
    async fn list(&self, start: &str, end: &str) -> StoreResult<Vec<ShortRecord>>;
}

/// Inclusive range test used by backends that filter in process.
pub fn key_in_range(key: &str, start: &str, end: &str) -> bool {
    key >= start && (end.is_empty() || key <= end)
}

/// True if no key can satisfy `[start, end]`.
pub fn range_is_empty(start: &str, end: &str) -> bool {
    !end.is_empty() && start > end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_in_range_inclusive() {
        assert!(key_in_range("b", "a", "c"));
        assert!(key_in_range("a", "a", "c"));
        assert!(key_in_range("c", "a", "c"));
        assert!(!key_in_range("d", "a", "c"));
    }

    #[test]
    fn test_open_bounds() {
        assert!(key_in_range("zzz", "", ""));
        assert!(key_in_range("zzz", "m", ""));
        assert!(!key_in_range("a", "m", ""));
        assert!(key_in_range("a", "", "b"));
    }

    #[test]
    fn test_range_is_empty() {
        assert!(range_is_empty("z", "a"));
        assert!(!range_is_empty("a", "z"));
        assert!(!range_is_empty("z", ""));
    }
}
