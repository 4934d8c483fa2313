//! Distributed column-store backend (CQL: Scylla or Cassandra).
//!
//! There is no in-process locking here. Ownership checks rely on lightweight
//! transactions (`IF ...` clauses) evaluated by the cluster.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::serialize::row::SerializeRow;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::{CqlValue, Row};
use tracing::{debug, info, warn};

use super::codec::{id_from_column, id_to_column};
use crate::domain::entities::{ShortRecord, UserRecord};
use crate::domain::repositories::{ShortRepository, UserRepository, key_in_range, range_is_empty};
use crate::error::{StoreError, StoreResult};
use crate::health::HealthCheck;

struct Statements {
    update_short: PreparedStatement,
    insert_short: PreparedStatement,
    select_short: PreparedStatement,
    delete_short: PreparedStatement,
    scan_shorts: PreparedStatement,
    insert_user: PreparedStatement,
    select_user: PreparedStatement,
    delete_user: PreparedStatement,
}

/// Backend over tables `short` and `users` in one keyspace.
///
/// The schema is managed outside the service (see `schema/cql`).
pub struct CqlStore {
    session: Session,
    statements: Statements,
}

impl CqlStore {
    /// Connects to the cluster, selects `keyspace` and prepares every
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if no node is reachable, the keyspace
    /// does not exist or a statement fails to prepare.
    pub async fn connect(hosts: &[String], keyspace: &str) -> StoreResult<Self> {
        let session = SessionBuilder::new()
            .known_nodes(hosts)
            .use_keyspace(keyspace, false)
            .build()
            .await
            .map_err(StoreError::backend)?;
        info!(?hosts, keyspace, "Connected to CQL cluster");

        let statements = Statements {
            update_short: prepare(
                &session,
                "UPDATE short SET long = ?, owner = ? WHERE short = ? IF owner = ?",
            )
            .await?,
            insert_short: prepare(
                &session,
                "INSERT INTO short (short, long, owner) VALUES (?, ?, ?) IF NOT EXISTS",
            )
            .await?,
            select_short: prepare(&session, "SELECT short, long, owner FROM short WHERE short = ?")
                .await?,
            delete_short: prepare(&session, "DELETE FROM short WHERE short = ? IF owner = ?")
                .await?,
            scan_shorts: prepare(&session, "SELECT short, long, owner FROM short").await?,
            insert_user: prepare(
                &session,
                "INSERT INTO users (uid, email, name) VALUES (?, ?, ?) IF NOT EXISTS",
            )
            .await?,
            select_user: prepare(&session, "SELECT uid, email, name FROM users WHERE uid = ?")
                .await?,
            delete_user: prepare(&session, "DELETE FROM users WHERE uid = ?").await?,
        };

        Ok(Self {
            session,
            statements,
        })
    }

    /// Runs a conditional statement and reads its `[applied]` row.
    async fn execute_lwt(
        &self,
        statement: &PreparedStatement,
        values: impl SerializeRow,
    ) -> StoreResult<LwtOutcome> {
        let rows = self
            .session
            .execute_unpaged(statement, values)
            .await
            .map_err(StoreError::backend)?
            .into_rows_result()
            .map_err(StoreError::backend)?;

        let specs = rows.column_specs();
        let applied_at = specs.get_by_name(APPLIED).map_or(0, |(i, _)| i);
        let owner_at = specs.get_by_name("owner").map(|(i, _)| i);

        let row = rows
            .maybe_first_row::<Row>()
            .map_err(StoreError::backend)?
            .ok_or_else(|| StoreError::backend("conditional statement returned no rows"))?;
        Ok(LwtOutcome::read(&row, applied_at, owner_at))
    }
}

async fn prepare(session: &Session, cql: &str) -> StoreResult<PreparedStatement> {
    session.prepare(cql).await.map_err(StoreError::backend)
}

const APPLIED: &str = "[applied]";

/// Result of a lightweight transaction.
///
/// Which columns follow `[applied]` on rejection differs between servers,
/// so they are located by name.
#[derive(Debug, PartialEq)]
struct LwtOutcome {
    applied: bool,
    /// Current owner reported by a rejected `IF owner = ?` statement.
    /// `None` when the row does not exist.
    owner: Option<i64>,
}

impl LwtOutcome {
    fn read(row: &Row, applied_at: usize, owner_at: Option<usize>) -> Self {
        let applied = matches!(
            row.columns.get(applied_at),
            Some(Some(CqlValue::Boolean(true)))
        );
        let owner = match owner_at.and_then(|i| row.columns.get(i)) {
            Some(Some(CqlValue::BigInt(owner))) => Some(*owner),
            _ => None,
        };
        Self { applied, owner }
    }
}

fn short_from_row((short, long, owner): (String, String, i64)) -> ShortRecord {
    ShortRecord::new(short, long, id_from_column(owner))
}

#[async_trait]
impl ShortRepository for CqlStore {
    async fn put(&self, record: &ShortRecord) -> StoreResult<()> {
        let owner = id_to_column(record.owner);

        let update = self
            .execute_lwt(
                &self.statements.update_short,
                (&record.long, owner, &record.short, owner),
            )
            .await?;
        if update.applied {
            return Ok(());
        }
        if let Some(current) = update.owner {
            debug!(short = %record.short, owner = id_from_column(current), requester = record.owner, "not owned");
            return Err(StoreError::PermissionDenied);
        }

        let insert = self
            .execute_lwt(
                &self.statements.insert_short,
                (&record.short, &record.long, owner),
            )
            .await?;
        if insert.applied {
            return Ok(());
        }

        warn!(short = %record.short, "conditional insert lost to a concurrent insert");
        Err(StoreError::Ambiguous(record.short.clone()))
    }

    async fn get(&self, short: &str) -> StoreResult<ShortRecord> {
        let row = self
            .session
            .execute_unpaged(&self.statements.select_short, (short,))
            .await
            .map_err(StoreError::backend)?
            .into_rows_result()
            .map_err(StoreError::backend)?
            .maybe_first_row::<(String, String, i64)>()
            .map_err(|e| StoreError::corrupt(short, e))?;

        row.map(short_from_row)
            .ok_or_else(|| StoreError::NotFound(short.to_string()))
    }

    /// Absent and not-owned rows both fail the `IF owner = ?` condition, so
    /// deleting a missing short reports [`StoreError::PermissionDenied`].
    async fn delete(&self, short: &str, owner: u64) -> StoreResult<()> {
        let outcome = self
            .execute_lwt(&self.statements.delete_short, (short, id_to_column(owner)))
            .await?;
        if outcome.applied {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied)
        }
    }

    /// Full scan filtered in process; partition keys cannot be range
    /// restricted. Results are in token order, not key order.
    async fn list(&self, start: &str, end: &str) -> StoreResult<Vec<ShortRecord>> {
        if range_is_empty(start, end) {
            return Ok(Vec::new());
        }

        let mut rows = self
            .session
            .execute_iter(self.statements.scan_shorts.clone(), ())
            .await
            .map_err(StoreError::backend)?
            .rows_stream::<(String, String, i64)>()
            .map_err(StoreError::backend)?;

        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(StoreError::backend)? {
            if key_in_range(&row.0, start, end) {
                records.push(short_from_row(row));
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl UserRepository for CqlStore {
    async fn lookup_or_create(&self, email: &str, name: &str) -> StoreResult<UserRecord> {
        let user = UserRecord::new(email, name);

        let outcome = self
            .execute_lwt(
                &self.statements.insert_user,
                (id_to_column(user.id), &user.email, &user.name),
            )
            .await?;
        if outcome.applied {
            info!(id = user.id, email, "created user");
            return Ok(user);
        }
        self.get_user(user.id).await
    }

    async fn get_user(&self, id: u64) -> StoreResult<UserRecord> {
        let row = self
            .session
            .execute_unpaged(&self.statements.select_user, (id_to_column(id),))
            .await
            .map_err(StoreError::backend)?
            .into_rows_result()
            .map_err(StoreError::backend)?
            .maybe_first_row::<(i64, String, String)>()
            .map_err(|e| StoreError::corrupt(id.to_string(), e))?;

        row.map(|(uid, email, name)| UserRecord {
            email,
            name,
            id: id_from_column(uid),
        })
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_user(&self, id: u64) -> StoreResult<()> {
        self.session
            .execute_unpaged(&self.statements.delete_user, (id_to_column(id),))
            .await
            .map(|_| ())
            .map_err(StoreError::backend)
    }
}

#[async_trait]
impl HealthCheck for CqlStore {
    fn name(&self) -> &str {
        "cql"
    }

    async fn healthz(&self) -> StoreResult<()> {
        self.session
            .await_schema_agreement()
            .await
            .map(|_| ())
            .map_err(StoreError::backend)
    }
}
