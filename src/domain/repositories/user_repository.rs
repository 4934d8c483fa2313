//! Repository trait for user records.

use crate::domain::entities::UserRecord;
use crate::error::StoreResult;
use async_trait::async_trait;

/// Store for [`UserRecord`]s keyed by the hash of their email.
///
/// # Implementations
///
/// Every backend in [`crate::infrastructure::persistence`] implements this
/// next to [`super::ShortRepository`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the stored user for `email`, creating it if absent.
    ///
    /// Concurrent calls for the same email converge on one stored record and
    /// all of them return it. An existing record is never modified, so a
    /// different `name` on a later call is ignored.
    async fn lookup_or_create(&self, email: &str, name: &str) -> StoreResult<UserRecord>;

    /// Fetches a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StoreError::NotFound`] if absent.
    async fn get_user(&self, id: u64) -> StoreResult<UserRecord>;

    /// Deletes a user by id. Deleting an absent user succeeds.
    async fn delete_user(&self, id: u64) -> StoreResult<()>;
}
