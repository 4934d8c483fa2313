//! Embedded ordered key-value backend on LMDB.
//!
//! Uses the heed crate. LMDB allows one write transaction per environment at
//! a time, so every ownership check and the mutation it guards run inside a
//! single write transaction:
//! - read transactions for `get`, `list` and `get_user`
//! - write transactions for `put`, `delete` and user creation
//!
//! Commits are synced to disk before they return. Write transactions wait on
//! the environment's writer lock and fsync on commit, so they run on the
//! blocking thread pool.

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, info};

use super::codec::{decode, encode};
use crate::domain::entities::{ShortRecord, UserRecord};
use crate::domain::repositories::{ShortRepository, UserRepository, range_is_empty};
use crate::error::{StoreError, StoreResult};
use crate::health::HealthCheck;

const SHORTS_DB: &str = "shorts";
const USERS_DB: &str = "users";

/// Backend over two named LMDB databases in one environment.
#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    shorts: Database<Str, Bytes>,
    users: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Opens (or creates) an environment in `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory holding the LMDB files
    /// * `map_size_mb` - Upper bound on the database size in megabytes
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the directory cannot be created or
    /// the environment cannot be opened.
    pub fn open(path: impl AsRef<Path>, map_size_mb: usize) -> StoreResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(StoreError::backend)?;

        // SAFETY: the environment is opened once per path by this process and
        // the files are not modified by anything but LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size_mb * 1024 * 1024)
                .max_dbs(2)
                .open(path)
        }
        .map_err(StoreError::backend)?;

        let mut wtxn = env.write_txn().map_err(StoreError::backend)?;
        let shorts = env
            .create_database(&mut wtxn, Some(SHORTS_DB))
            .map_err(StoreError::backend)?;
        let users = env
            .create_database(&mut wtxn, Some(USERS_DB))
            .map_err(StoreError::backend)?;
        wtxn.commit().map_err(StoreError::backend)?;

        info!(path = %path.display(), map_size_mb, "opened LMDB environment");
        Ok(Self { env, shorts, users })
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Self) -> StoreResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(StoreError::backend)?
    }

    fn put_record(&self, record: &ShortRecord) -> StoreResult<()> {
        let encoded = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(StoreError::backend)?;

        if let Some(bytes) = self
            .shorts
            .get(&wtxn, &record.short)
            .map_err(StoreError::backend)?
        {
            let prev: ShortRecord = decode(&record.short, bytes)?;
            if !prev.is_owned_by(record.owner) {
                debug!(short = %record.short, owner = prev.owner, requester = record.owner, "not owned");
                return Err(StoreError::PermissionDenied);
            }
        }

        self.shorts
            .put(&mut wtxn, &record.short, &encoded)
            .map_err(StoreError::backend)?;
        wtxn.commit().map_err(StoreError::backend)
    }

    fn delete_record(&self, short: &str, owner: u64) -> StoreResult<()> {
        let mut wtxn = self.env.write_txn().map_err(StoreError::backend)?;

        let Some(bytes) = self.shorts.get(&wtxn, short).map_err(StoreError::backend)? else {
            return Ok(());
        };
        let prev: ShortRecord = decode(short, bytes)?;
        if !prev.is_owned_by(owner) {
            debug!(short, owner = prev.owner, requester = owner, "not owned");
            return Err(StoreError::PermissionDenied);
        }

        self.shorts
            .delete(&mut wtxn, short)
            .map_err(StoreError::backend)?;
        wtxn.commit().map_err(StoreError::backend)
    }

    fn lookup_or_create_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        let key = user.id.to_be_bytes();
        let mut wtxn = self.env.write_txn().map_err(StoreError::backend)?;

        if let Some(bytes) = self.users.get(&wtxn, &key).map_err(StoreError::backend)? {
            return decode(&user.email, bytes);
        }

        self.users
            .put(&mut wtxn, &key, &encode(&user)?)
            .map_err(StoreError::backend)?;
        wtxn.commit().map_err(StoreError::backend)?;

        info!(id = user.id, email = %user.email, "created user");
        Ok(user)
    }
}

#[async_trait]
impl ShortRepository for LmdbStore {
    async fn put(&self, record: &ShortRecord) -> StoreResult<()> {
        let record = record.clone();
        self.blocking(move |store| store.put_record(&record)).await
    }

    async fn get(&self, short: &str) -> StoreResult<ShortRecord> {
        let rtxn = self.env.read_txn().map_err(StoreError::backend)?;
        match self.shorts.get(&rtxn, short).map_err(StoreError::backend)? {
            Some(bytes) => decode(short, bytes),
            None => Err(StoreError::NotFound(short.to_string())),
        }
    }

    async fn delete(&self, short: &str, owner: u64) -> StoreResult<()> {
        let short = short.to_string();
        self.blocking(move |store| store.delete_record(&short, owner))
            .await
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
        let range = (Bound::Included(start), upper);

        let rtxn = self.env.read_txn().map_err(StoreError::backend)?;
        let mut records = Vec::new();
        for item in self
            .shorts
            .range(&rtxn, &range)
            .map_err(StoreError::backend)?
        {
            let (key, value) = item.map_err(StoreError::backend)?;
            records.push(decode(key, value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl UserRepository for LmdbStore {
    async fn lookup_or_create(&self, email: &str, name: &str) -> StoreResult<UserRecord> {
        let user = UserRecord::new(email, name);
        self.blocking(move |store| store.lookup_or_create_user(user))
            .await
    }

    async fn get_user(&self, id: u64) -> StoreResult<UserRecord> {
        let rtxn = self.env.read_txn().map_err(StoreError::backend)?;
        match self
            .users
            .get(&rtxn, &id.to_be_bytes())
            .map_err(StoreError::backend)?
        {
            Some(bytes) => decode(&id.to_string(), bytes),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn delete_user(&self, id: u64) -> StoreResult<()> {
        self.blocking(move |store| {
            let mut wtxn = store.env.write_txn().map_err(StoreError::backend)?;
            store
                .users
                .delete(&mut wtxn, &id.to_be_bytes())
                .map_err(StoreError::backend)?;
            wtxn.commit().map_err(StoreError::backend)
        })
        .await
    }
}

#[async_trait]
impl HealthCheck for LmdbStore {
    fn name(&self) -> &str {
        "lmdb"
    }

    async fn healthz(&self) -> StoreResult<()> {
        let rtxn = self.env.read_txn().map_err(StoreError::backend)?;
        self.shorts
            .len(&rtxn)
            .map(|_| ())
            .map_err(StoreError::backend)
    }
}
