//! Process-local backend.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{ShortRecord, UserRecord, user_id};
use crate::domain::repositories::{ShortRepository, UserRepository, range_is_empty};
use crate::error::{StoreError, StoreResult};
use crate::health::HealthCheck;

/// In-memory backend for development and tests.
///
/// Each map sits behind one reader-writer lock. Writes hold the write guard
/// across the ownership check and the mutation, so they never interleave;
/// reads share the lock.
#[derive(Default)]
pub struct MemoryStore {
    shorts: RwLock<BTreeMap<String, ShortRecord>>,
    users: RwLock<HashMap<u64, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn shorts_read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ShortRecord>> {
        self.shorts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn shorts_write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ShortRecord>> {
        self.shorts.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn users_read(&self) -> RwLockReadGuard<'_, HashMap<u64, UserRecord>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn users_write(&self) -> RwLockWriteGuard<'_, HashMap<u64, UserRecord>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ShortRepository for MemoryStore {
    async fn put(&self, record: &ShortRecord) -> StoreResult<()> {
        let mut shorts = self.shorts_write();
        if let Some(prev) = shorts.get(&record.short)
            && !prev.is_owned_by(record.owner)
        {
            return Err(StoreError::PermissionDenied);
        }
        shorts.insert(record.short.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, short: &str) -> StoreResult<ShortRecord> {
        self.shorts_read()
            .get(short)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(short.to_string()))
    }

    async fn delete(&self, short: &str, owner: u64) -> StoreResult<()> {
        let mut shorts = self.shorts_write();
        match shorts.get(short) {
            Some(prev) if !prev.is_owned_by(owner) => Err(StoreError::PermissionDenied),
            Some(_) => {
                shorts.remove(short);
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn list(&self, start: &str, end: &str) -> StoreResult<Vec<ShortRecord>> {
        if range_is_empty(start, end) {
            return Ok(Vec::new());
        }
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(end)
        };

        Ok(self
            .shorts_read()
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn lookup_or_create(&self, email: &str, name: &str) -> StoreResult<UserRecord> {
        let mut users = self.users_write();
        let user = users
            .entry(user_id(email))
            .or_insert_with(|| UserRecord::new(email, name));
        Ok(user.clone())
    }

    async fn get_user(&self, id: u64) -> StoreResult<UserRecord> {
        self.users_read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_user(&self, id: u64) -> StoreResult<()> {
        self.users_write().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn healthz(&self) -> StoreResult<()> {
        if self.shorts.is_poisoned() || self.users.is_poisoned() {
            return Err(StoreError::backend("lock poisoned"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        store
            .put(&ShortRecord::new("miserable", "pigeon", 0))
            .await
            .unwrap();

        let record = store.get("miserable").await.unwrap();
        assert_eq!(record.long, "pigeon");
    }

    #[tokio::test]
    async fn test_put_delete_get() {
        let store = MemoryStore::new();
        store
            .put(&ShortRecord::new("miserable", "pigeon", 0))
            .await
            .unwrap();
        store.delete("miserable", 0).await.unwrap();

        assert_eq!(
            store.get("miserable").await,
            Err(StoreError::NotFound("miserable".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_inclusive() {
        let store = MemoryStore::new();
        for short in ["d", "a", "c", "b", "e"] {
            store.put(&ShortRecord::new(short, "http://x", 1)).await.unwrap();
        }

        let keys: Vec<String> = store
            .list("b", "d")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.short)
            .collect();
        assert_eq!(keys, vec!["b", "c", "d"]);

        assert_eq!(store.list("", "").await.unwrap().len(), 5);
        assert!(store.list("e", "a").await.unwrap().is_empty());
    }
}
