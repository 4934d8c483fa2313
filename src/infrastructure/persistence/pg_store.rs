//! PostgreSQL backend.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

use super::codec::{id_from_column, id_to_column};
use crate::domain::entities::{ShortRecord, UserRecord};
use crate::domain::repositories::{ShortRepository, UserRepository, range_is_empty};
use crate::error::{StoreError, StoreResult};
use crate::health::HealthCheck;

#[derive(FromRow)]
struct ShortRow {
    short: String,
    long: String,
    owner: i64,
}

impl From<ShortRow> for ShortRecord {
    fn from(row: ShortRow) -> Self {
        ShortRecord::new(row.short, row.long, id_from_column(row.owner))
    }
}

#[derive(FromRow)]
struct UserRow {
    uid: i64,
    email: String,
    name: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            email: row.email,
            name: row.name,
            id: id_from_column(row.uid),
        }
    }
}

/// Backend over tables `shorts` and `users`.
///
/// Ownership-checked writes run in a transaction that locks the row with
/// `SELECT ... FOR UPDATE` before checking the owner.
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connects a pool and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(StoreError::backend)?;
        info!("Connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StoreError::backend)?;
        info!("Migrations applied");

        Ok(Self::new(Arc::new(pool)))
    }

    async fn lock_owner(
        tx: &mut Transaction<'_, Postgres>,
        short: &str,
    ) -> StoreResult<Option<u64>> {
        let owner: Option<i64> =
            sqlx::query_scalar("SELECT owner FROM shorts WHERE short = $1 FOR UPDATE")
                .bind(short)
                .fetch_optional(&mut **tx)
                .await
                .map_err(StoreError::backend)?;
        Ok(owner.map(id_from_column))
    }
}

#[async_trait]
impl ShortRepository for PgStore {
    async fn put(&self, record: &ShortRecord) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        let mut current = Self::lock_owner(&mut tx, &record.short).await?;
        if current.is_none() {
            let inserted = sqlx::query(
                r#"
                INSERT INTO shorts (short, long, owner)
                VALUES ($1, $2, $3)
                ON CONFLICT (short) DO NOTHING
                "#,
            )
            .bind(&record.short)
            .bind(&record.long)
            .bind(id_to_column(record.owner))
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?
            .rows_affected();

            if inserted == 1 {
                return tx.commit().await.map_err(StoreError::backend);
            }
            debug!(short = %record.short, "lost insert race, re-checking owner");
            current = Self::lock_owner(&mut tx, &record.short).await?;
        }

        if let Some(owner) = current
            && owner != record.owner
        {
            return Err(StoreError::PermissionDenied);
        }

        sqlx::query(
            r#"
            INSERT INTO shorts (short, long, owner)
            VALUES ($1, $2, $3)
            ON CONFLICT (short) DO UPDATE SET long = EXCLUDED.long, owner = EXCLUDED.owner
            "#,
        )
        .bind(&record.short)
        .bind(&record.long)
        .bind(id_to_column(record.owner))
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;

        tx.commit().await.map_err(StoreError::backend)
    }

    async fn get(&self, short: &str) -> StoreResult<ShortRecord> {
        let row = sqlx::query_as::<_, ShortRow>(
            "SELECT short, long, owner FROM shorts WHERE short = $1",
        )
        .bind(short)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(StoreError::backend)?;

        row.map(ShortRecord::from)
            .ok_or_else(|| StoreError::NotFound(short.to_string()))
    }

    async fn delete(&self, short: &str, owner: u64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        match Self::lock_owner(&mut tx, short).await? {
            None => Ok(()),
            Some(current) if current != owner => Err(StoreError::PermissionDenied),
            Some(_) => {
                sqlx::query("DELETE FROM shorts WHERE short = $1")
                    .bind(short)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::backend)?;
                tx.commit().await.map_err(StoreError::backend)
            }
        }
    }

    async fn list(&self, start: &str, end: &str) -> StoreResult<Vec<ShortRecord>> {
        if range_is_empty(start, end) {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ShortRow>(
            r#"
            SELECT short, long, owner
            FROM shorts
            WHERE short >= $1 AND ($2 = '' OR short <= $2)
            ORDER BY short
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(ShortRecord::from).collect())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn lookup_or_create(&self, email: &str, name: &str) -> StoreResult<UserRecord> {
        let user = UserRecord::new(email, name);

        let created = sqlx::query(
            "INSERT INTO users (uid, email, name) VALUES ($1, $2, $3) ON CONFLICT (uid) DO NOTHING",
        )
        .bind(id_to_column(user.id))
        .bind(&user.email)
        .bind(&user.name)
        .execute(self.pool.as_ref())
        .await
        .map_err(StoreError::backend)?
        .rows_affected();

        if created == 1 {
            info!(id = user.id, email, "created user");
            return Ok(user);
        }
        self.get_user(user.id).await
    }

    async fn get_user(&self, id: u64) -> StoreResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>("SELECT uid, email, name FROM users WHERE uid = $1")
            .bind(id_to_column(id))
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(StoreError::backend)?;

        row.map(UserRecord::from)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_user(&self, id: u64) -> StoreResult<()> {
        sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(id_to_column(id))
            .execute(self.pool.as_ref())
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn healthz(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .map(|_| ())
            .map_err(StoreError::backend)
    }
}
