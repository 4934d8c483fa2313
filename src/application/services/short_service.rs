//! Read-through coordinator for short aliases.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::entities::ShortRecord;
use crate::domain::repositories::ShortRepository;
use crate::error::{StoreError, StoreResult};
use crate::health::HealthCheck;
use crate::infrastructure::cache::{HeapCache, KvCache};
use crate::utils::validation::{normalize_long, validate_short};

/// A cached redirect target and the moment it was cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedUrl {
    pub long: String,
    pub stored_at: Instant,
}

/// Serves redirects from an in-process cache in front of the storage backend.
///
/// The backend is authoritative. The cache is only filled by successful
/// writes, never by reads: a read miss goes to the backend and leaves the
/// cache as it was. A cached entry older than the TTL is dropped on the next
/// read and the backend is consulted instead.
///
/// Errors from the backend are returned unchanged and nothing is retried.
pub struct ShortService<R: ShortRepository + ?Sized> {
    repository: Arc<R>,
    cache: Option<Arc<dyn KvCache<CachedUrl>>>,
    ttl: Duration,
}

impl<R: ShortRepository + ?Sized> ShortService<R> {
    /// Creates a coordinator over `repository`. Pass `None` to disable caching.
    pub fn new(
        repository: Arc<R>,
        cache: Option<Arc<dyn KvCache<CachedUrl>>>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    /// Creates a coordinator with a [`HeapCache`] of `capacity` entries.
    /// A capacity of zero disables the cache.
    pub fn with_capacity(repository: Arc<R>, capacity: usize, ttl: Duration) -> Self {
        let cache = (capacity > 0)
            .then(|| Arc::new(HeapCache::<CachedUrl>::new(capacity)) as Arc<dyn KvCache<CachedUrl>>);
        Self::new(repository, cache, ttl)
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn is_fresh(&self, entry: &CachedUrl) -> bool {
        Instant::now().saturating_duration_since(entry.stored_at) < self.ttl
    }

    /// Resolves `short` to its long URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record exists, or whatever the
    /// backend reports.
    pub async fn read_short(&self, short: &str) -> StoreResult<String> {
        if let Some(cache) = &self.cache {
            match cache.get(short) {
                Ok(entry) if self.is_fresh(&entry) => {
                    debug!(short, long = %entry.long, "cache hit");
                    return Ok(entry.long);
                }
                Ok(_) => {
                    debug!(short, "cache entry expired");
                    if let Err(e) = cache.invalidate(short) {
                        debug!(short, error = %e, "nothing to invalidate");
                    }
                }
                Err(_) => debug!(short, "cache miss"),
            }
        }

        let record = self.repository.get(short).await?;
        Ok(record.long)
    }

    /// Validates and stores `record`, then caches its long URL.
    ///
    /// `record.long` is stored as given; callers apply
    /// [`crate::utils::validation::normalize_long`] first if they want a
    /// scheme added.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidValue`] for a malformed or reserved alias, or an unusable URL
    /// - [`StoreError::Empty`] for an empty URL
    /// - [`StoreError::PermissionDenied`] if another owner holds the alias
    pub async fn write_short(&self, record: ShortRecord) -> StoreResult<ShortRecord> {
        validate_short(&record.short)?;
        normalize_long(&record.long)?;
        if record.long.chars().any(char::is_control) {
            return Err(StoreError::InvalidValue(record.long));
        }

        self.repository.put(&record).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(&record.short) {
                debug!(short = %record.short, error = %e, "nothing to invalidate");
            }
            debug!(short = %record.short, long = %record.long, "cache replace");
            cache.put(
                &record.short,
                CachedUrl {
                    long: record.long.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
        Ok(record)
    }

    /// Deletes `short` on behalf of `owner` and drops it from the cache.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidValue`] for a malformed or reserved alias
    /// - [`StoreError::PermissionDenied`] if `owner` does not own the alias
    pub async fn delete_short(&self, short: &str, owner: u64) -> StoreResult<()> {
        validate_short(short)?;

        self.repository.delete(short, owner).await?;

        if let Some(cache) = &self.cache {
            match cache.invalidate(short) {
                Ok(_) => debug!(short, "cache invalidation"),
                Err(e) => debug!(short, error = %e, "nothing to invalidate"),
            }
        }
        Ok(())
    }

    /// Records with `start <= short <= end`; an empty bound is open.
    pub async fn list_shorts(&self, start: &str, end: &str) -> StoreResult<Vec<ShortRecord>> {
        self.repository.list(start, end).await
    }
}

#[async_trait]
impl<R: ShortRepository + ?Sized + 'static> HealthCheck for ShortService<R> {
    fn name(&self) -> &str {
        "short-service"
    }

    async fn healthz(&self) -> StoreResult<()> {
        match &self.cache {
            Some(cache) if !cache.is_healthy() => Err(StoreError::backend("cache lock poisoned")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortRepository;

    const TTL: Duration = Duration::from_secs(300);

    fn service(repo: MockShortRepository) -> ShortService<MockShortRepository> {
        ShortService::with_capacity(Arc::new(repo), 16, TTL)
    }

    fn expect_put_ok(repo: &mut MockShortRepository, times: usize) {
        repo.expect_put().times(times).returning(|_| Ok(()));
    }

    #[tokio::test]
    async fn test_read_within_ttl_skips_backend() {
        let mut repo = MockShortRepository::new();
        expect_put_ok(&mut repo, 1);
        repo.expect_get().times(0);

        let service = service(repo);
        service
            .write_short(ShortRecord::new("miserable", "pigeon", 7))
            .await
            .unwrap();

        assert_eq!(service.read_short("miserable").await.unwrap(), "pigeon");
        assert_eq!(service.read_short("miserable").await.unwrap(), "pigeon");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_queries_backend() {
        let mut repo = MockShortRepository::new();
        expect_put_ok(&mut repo, 1);
        repo.expect_get()
            .withf(|short| short == "miserable")
            .times(2)
            .returning(|short| Ok(ShortRecord::new(short, "http://fresh", 7)));

        let service = service(repo);
        service
            .write_short(ShortRecord::new("miserable", "pigeon", 7))
            .await
            .unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_eq!(service.read_short("miserable").await.unwrap(), "http://fresh");

        // The expired entry is gone and reads do not refill the cache.
        assert_eq!(service.read_short("miserable").await.unwrap(), "http://fresh");
    }

    #[tokio::test]
    async fn test_read_miss_does_not_populate_cache() {
        let mut repo = MockShortRepository::new();
        repo.expect_get()
            .times(3)
            .returning(|short| Ok(ShortRecord::new(short, "http://x", 1)));

        let service = service(repo);
        for _ in 0..3 {
            assert_eq!(service.read_short("a").await.unwrap(), "http://x");
        }
    }

    #[tokio::test]
    async fn test_read_not_found_propagates() {
        let mut repo = MockShortRepository::new();
        repo.expect_get()
            .times(1)
            .returning(|short| Err(StoreError::NotFound(short.to_string())));

        let service = service(repo);
        assert_eq!(
            service.read_short("nope").await,
            Err(StoreError::NotFound("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_write_replaces_cached_value() {
        let mut repo = MockShortRepository::new();
        expect_put_ok(&mut repo, 2);
        repo.expect_get().times(0);

        let service = service(repo);
        service
            .write_short(ShortRecord::new("a", "http://one", 1))
            .await
            .unwrap();
        service
            .write_short(ShortRecord::new("a", "http://two", 1))
            .await
            .unwrap();

        assert_eq!(service.read_short("a").await.unwrap(), "http://two");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_alone() {
        let mut repo = MockShortRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::PermissionDenied));
        repo.expect_get().times(0);

        let service = service(repo);
        service
            .write_short(ShortRecord::new("a", "http://mine", 1))
            .await
            .unwrap();

        let err = service
            .write_short(ShortRecord::new("a", "http://theirs", 2))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::PermissionDenied);
        assert_eq!(service.read_short("a").await.unwrap(), "http://mine");
    }

    #[tokio::test]
    async fn test_delete_invalidates_cache() {
        let mut repo = MockShortRepository::new();
        expect_put_ok(&mut repo, 1);
        repo.expect_delete()
            .withf(|short, owner| short == "miserable" && *owner == 7)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_get()
            .times(1)
            .returning(|short| Err(StoreError::NotFound(short.to_string())));

        let service = service(repo);
        service
            .write_short(ShortRecord::new("miserable", "pigeon", 7))
            .await
            .unwrap();
        service.delete_short("miserable", 7).await.unwrap();

        assert!(service.read_short("miserable").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_of_uncached_key_succeeds() {
        let mut repo = MockShortRepository::new();
        repo.expect_delete().times(1).returning(|_, _| Ok(()));

        let service = service(repo);
        assert!(service.delete_short("never-cached", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation_happens_before_backend() {
        let mut repo = MockShortRepository::new();
        repo.expect_put().times(0);
        repo.expect_delete().times(0);

        let service = service(repo);
        let overlong = "a".repeat(256);
        for short in ["create", "delete", "healthz", "has space", "", overlong.as_str()] {
            let err = service
                .write_short(ShortRecord::new(short, "http://x", 1))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidValue(_)), "{short:?}: {err:?}");
        }
        assert_eq!(
            service.write_short(ShortRecord::new("ok", "", 1)).await,
            Err(StoreError::Empty)
        );
        assert!(matches!(
            service
                .write_short(ShortRecord::new("ok", "http://x.org/a\u{1}b", 1))
                .await,
            Err(StoreError::InvalidValue(_))
        ));
        assert!(matches!(
            service.delete_short("healthz", 1).await,
            Err(StoreError::InvalidValue(_))
        ));
    }

    #[tokio::test]
    async fn test_without_cache_every_read_hits_backend() {
        let mut repo = MockShortRepository::new();
        expect_put_ok(&mut repo, 1);
        repo.expect_get()
            .times(2)
            .returning(|short| Ok(ShortRecord::new(short, "http://x", 1)));

        let service = ShortService::with_capacity(Arc::new(repo), 0, TTL);
        assert!(!service.is_cache_enabled());

        service
            .write_short(ShortRecord::new("a", "http://x", 1))
            .await
            .unwrap();
        service.read_short("a").await.unwrap();
        service.read_short("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_liveness() {
        let service = service(MockShortRepository::new());
        assert_eq!(service.name(), "short-service");
        assert!(service.healthz().await.is_ok());
    }
}
