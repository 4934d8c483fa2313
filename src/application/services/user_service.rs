//! User lookup and creation.

use std::sync::Arc;
use tracing::info;

use crate::domain::entities::UserRecord;
use crate::domain::repositories::UserRepository;
use crate::error::{StoreError, StoreResult};

/// Thin service over [`UserRepository`].
pub struct UserService<R: UserRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: UserRepository + ?Sized> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the stored user for `email`, creating it on first sight.
    ///
    /// The name is only used when the user is created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Empty`] if `email` is blank.
    pub async fn login(&self, email: &str, name: &str) -> StoreResult<UserRecord> {
        let email = email.trim();
        if email.is_empty() {
            return Err(StoreError::Empty);
        }
        let user = self.repository.lookup_or_create(email, name.trim()).await?;
        info!(id = user.id, email = %user.email, "login");
        Ok(user)
    }

    pub async fn user(&self, id: u64) -> StoreResult<UserRecord> {
        self.repository.get_user(id).await
    }

    pub async fn delete_user(&self, id: u64) -> StoreResult<()> {
        self.repository.delete_user(id).await
    }
}
