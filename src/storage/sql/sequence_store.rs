//! Unified SQL SequenceStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use tracing::warn;

use super::SqlDatabase;
use crate::interfaces::{Result, StorageError};

/// SQL-based implementation of SequenceStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite). The store does not own the
/// host table; [`SequenceSpec`](crate::config::SequenceSpec) names it at
/// call time.
pub struct SqlSequenceStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlSequenceStore<DB> {
    /// Create a new SQL sequence store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Commit `tx` when `result` is `Ok`, otherwise roll it back and return the
/// original error.
async fn settle<D, T>(tx: sqlx::Transaction<'_, D>, result: Result<T>) -> Result<T>
where
    D: sqlx::Database,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

fn map_insert_error(
    e: sqlx::Error,
    table: &str,
    key: &crate::interfaces::RecordKey,
) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::DuplicateKey {
            table: table.to_string(),
            key: key.clone(),
        },
        _ => StorageError::Database(e),
    }
}

/// Macro to implement SequenceStore for a specific SQL backend.
///
/// `$conn` is the backend's connection type; statements inside an atomic
/// unit run on the transaction's connection.
macro_rules! impl_sequence_store {
    ($db_type:ty, $conn:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlSequenceStore<$db_type> {
            /// Create the sequence table and its position index if missing.
            ///
            /// Host applications normally own their schema; this is for
            /// standalone use and tests.
            pub async fn ensure_table(
                &self,
                spec: &crate::config::SequenceSpec,
                key: super::ColumnKind,
                scope_columns: &[(&str, super::ColumnKind)],
            ) -> Result<()> {
                use super::statements;

                let sql = <$db_type>::build_table_create(statements::create_table(
                    spec,
                    key,
                    scope_columns,
                ));
                sqlx::query(&sql).execute(&self.pool).await?;

                let names: Vec<&str> = scope_columns.iter().map(|(name, _)| *name).collect();
                let sql = <$db_type>::build_index_create(statements::create_position_index(
                    spec, &names,
                ));
                sqlx::query(&sql).execute(&self.pool).await?;

                tracing::info!(table = %spec.table, "Sequence table ready");
                Ok(())
            }

            async fn exec_update(conn: &mut $conn, sql: String) -> Result<u64> {
                Ok(sqlx::query(&sql).execute(&mut *conn).await?.rows_affected())
            }

            async fn write_position(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                position: i64,
            ) -> Result<()> {
                let sql =
                    <$db_type>::build_update(super::statements::set_position(spec, scope, key, position));
                if Self::exec_update(conn, sql).await? == 0 {
                    return Err(StorageError::RecordNotFound {
                        table: spec.table.clone(),
                        key: key.clone(),
                    });
                }
                Ok(())
            }

            async fn fetch_max(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
            ) -> Result<Option<i64>> {
                use sqlx::Row;

                let sql = <$db_type>::build_select(super::statements::max_position(spec, scope));
                let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
                Ok(row.try_get::<Option<i64>, _>(super::statements::MAX_POSITION)?)
            }

            async fn apply_insert(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                position: Option<i64>,
            ) -> Result<i64> {
                let position = match position {
                    Some(position) => position,
                    None => crate::position::next_position(
                        Self::fetch_max(&mut *conn, spec, scope).await?,
                        spec.initial_position,
                    ),
                };
                let sql = <$db_type>::build_insert(super::statements::insert(spec, scope, key, position)?);
                sqlx::query(&sql)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| map_insert_error(e, &spec.table, key))?;
                Ok(position)
            }

            async fn apply_move(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                from: i64,
                to: i64,
            ) -> Result<()> {
                let plan = crate::position::ShiftPlan::for_move(from, to);
                if let Some(shift) = plan.shift(Some(key.clone())) {
                    let sql = <$db_type>::build_update(super::statements::shift(spec, scope, &shift));
                    Self::exec_update(&mut *conn, sql).await?;
                }
                Self::write_position(conn, spec, scope, key, to).await
            }

            async fn apply_remove(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                position: i64,
            ) -> Result<u64> {
                let sql = <$db_type>::build_delete(super::statements::delete(spec, scope, key));
                let deleted = sqlx::query(&sql).execute(&mut *conn).await?.rows_affected();
                if deleted == 0 {
                    return Err(StorageError::RecordNotFound {
                        table: spec.table.clone(),
                        key: key.clone(),
                    });
                }
                let shift = crate::position::shift_after_delete(position);
                let sql = <$db_type>::build_update(super::statements::shift(spec, scope, &shift));
                Self::exec_update(conn, sql).await
            }

            async fn apply_swap(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                a: (&crate::interfaces::RecordKey, i64),
                b: (&crate::interfaces::RecordKey, i64),
            ) -> Result<()> {
                Self::write_position(&mut *conn, spec, scope, a.0, b.1).await?;
                Self::write_position(conn, spec, scope, b.0, a.1).await
            }

            async fn apply_renumber(
                conn: &mut $conn,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                keys: &[crate::interfaces::RecordKey],
            ) -> Result<()> {
                for (i, key) in keys.iter().enumerate() {
                    let position = spec.initial_position + i as i64;
                    Self::write_position(&mut *conn, spec, scope, key, position).await?;
                }
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::SequenceStore for SqlSequenceStore<$db_type> {
            async fn max_position(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
            ) -> Result<Option<i64>> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_max(&mut conn, spec, scope).await
            }

            async fn count(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
            ) -> Result<u64> {
                use sqlx::Row;

                let sql = <$db_type>::build_select(super::statements::count(spec, scope));
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                let count: i64 = row.try_get(super::statements::ROW_COUNT)?;
                Ok(count as u64)
            }

            async fn position_of(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
            ) -> Result<Option<i64>> {
                use sqlx::Row;

                let sql =
                    <$db_type>::build_select(super::statements::position_of(spec, scope, key));
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => Ok(Some(row.try_get(super::statements::POSITION)?)),
                    None => Ok(None),
                }
            }

            async fn entries(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                order: Option<crate::position::PositionOrder>,
            ) -> Result<Vec<crate::interfaces::Entry>> {
                use sqlx::Row;

                use super::statements::{POSITION, RECORD_KEY};
                use crate::interfaces::RecordKey;

                let sql = <$db_type>::build_select(super::statements::entries(spec, scope, order));
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

                let mut entries = Vec::with_capacity(rows.len());
                for row in rows {
                    // Integer keys first; anything else is read as text.
                    let key = match row.try_get::<i64, _>(RECORD_KEY) {
                        Ok(id) => RecordKey::Int(id),
                        Err(_) => match row.try_get::<i32, _>(RECORD_KEY) {
                            Ok(id) => RecordKey::Int(id.into()),
                            Err(_) => RecordKey::Text(row.try_get::<String, _>(RECORD_KEY)?),
                        },
                    };
                    entries.push(crate::interfaces::Entry {
                        key,
                        position: row.try_get(POSITION)?,
                    });
                }
                Ok(entries)
            }

            async fn insert(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                position: Option<i64>,
            ) -> Result<i64> {
                let mut tx = self.pool.begin().await?;
                let result = Self::apply_insert(&mut tx, spec, scope, key, position).await;
                let position = settle(tx, result).await?;

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    key = %key,
                    position,
                    "Inserted record"
                );
                Ok(position)
            }

            async fn shift(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                shift: &crate::interfaces::Shift,
            ) -> Result<u64> {
                let sql = <$db_type>::build_update(super::statements::shift(spec, scope, shift));
                let touched = sqlx::query(&sql).execute(&self.pool).await?.rows_affected();

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    range = ?shift.range,
                    direction = ?shift.direction,
                    touched,
                    "Shifted siblings"
                );
                Ok(touched)
            }

            async fn commit_move(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                from: i64,
                to: i64,
            ) -> Result<()> {
                let mut tx = self.pool.begin().await?;
                let result = Self::apply_move(&mut tx, spec, scope, key, from, to).await;
                settle(tx, result).await?;

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    key = %key,
                    from,
                    to,
                    "Committed move"
                );
                Ok(())
            }

            async fn remove(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                key: &crate::interfaces::RecordKey,
                position: i64,
            ) -> Result<()> {
                let mut tx = self.pool.begin().await?;
                let result = Self::apply_remove(&mut tx, spec, scope, key, position).await;
                let shifted = settle(tx, result).await?;

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    key = %key,
                    position,
                    shifted,
                    "Removed record"
                );
                Ok(())
            }

            async fn commit_swap(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                a: (&crate::interfaces::RecordKey, i64),
                b: (&crate::interfaces::RecordKey, i64),
            ) -> Result<()> {
                let mut tx = self.pool.begin().await?;
                let result = Self::apply_swap(&mut tx, spec, scope, a, b).await;
                settle(tx, result).await?;

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    a = %a.0,
                    b = %b.0,
                    "Swapped positions"
                );
                Ok(())
            }

            async fn renumber(
                &self,
                spec: &crate::config::SequenceSpec,
                scope: &crate::interfaces::Scope,
                keys: &[crate::interfaces::RecordKey],
            ) -> Result<()> {
                let mut tx = self.pool.begin().await?;
                let result = Self::apply_renumber(&mut tx, spec, scope, keys).await;
                settle(tx, result).await?;

                tracing::debug!(
                    table = %spec.table,
                    scope = %scope,
                    rows = keys.len(),
                    "Renumbered sequence"
                );
                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_sequence_store!(super::postgres::Postgres, sqlx::PgConnection, "postgres");
impl_sequence_store!(super::sqlite::Sqlite, sqlx::SqliteConnection, "sqlite");
