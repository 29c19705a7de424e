//! Mock SequenceStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::SequenceSpec;
use crate::interfaces::{Entry, RecordKey, Result, Scope, SequenceStore, Shift, StorageError};
use crate::position::{next_position, shift_after_delete, PositionOrder, ShiftPlan};

/// One stored row.
#[derive(Debug, Clone)]
struct MockRow {
    key: RecordKey,
    scope: Scope,
    position: i64,
}

/// Working copy of one table for the duration of an atomic unit.
///
/// Statements are applied to the copy; the store only replaces the table
/// when the whole unit succeeded.
struct Unit<'a> {
    table: &'a str,
    rows: Vec<MockRow>,
    statements: usize,
    fail_on: Option<usize>,
}

impl Unit<'_> {
    fn statement(&mut self) -> Result<()> {
        self.statements += 1;
        if self.fail_on == Some(self.statements) {
            return Err(StorageError::Injected(format!(
                "write statement {} on {}",
                self.statements, self.table
            )));
        }
        Ok(())
    }

    fn shift(&mut self, scope: &Scope, shift: &Shift) -> Result<u64> {
        self.statement()?;
        let mut touched = 0;
        for row in self.rows.iter_mut() {
            if scope.contains(&row.scope) && shift.applies_to(&row.key, row.position) {
                row.position += shift.direction.delta();
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn set_position(&mut self, scope: &Scope, key: &RecordKey, position: i64) -> Result<()> {
        self.statement()?;
        let table = self.table;
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.key == *key && scope.contains(&row.scope))
            .ok_or_else(|| StorageError::RecordNotFound {
                table: table.to_string(),
                key: key.clone(),
            })?;
        row.position = position;
        Ok(())
    }

    fn delete(&mut self, scope: &Scope, key: &RecordKey) -> Result<()> {
        self.statement()?;
        let before = self.rows.len();
        self.rows
            .retain(|row| !(row.key == *key && scope.contains(&row.scope)));
        if self.rows.len() == before {
            return Err(StorageError::RecordNotFound {
                table: self.table.to_string(),
                key: key.clone(),
            });
        }
        Ok(())
    }
}

/// Mock sequence store that keeps rows in memory.
///
/// Mirrors the SQL backends: every atomic method works on a copy of the
/// table, so an injected failure leaves no partial writes behind.
#[derive(Default)]
pub struct MockSequenceStore {
    tables: RwLock<HashMap<String, Vec<MockRow>>>,
    fail_on_write: RwLock<Option<usize>>,
    fail_on_read: RwLock<bool>,
}

impl MockSequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th write statement (1-based) of every following atomic
    /// unit. `None` disables injection.
    pub async fn set_fail_on_write(&self, n: Option<usize>) {
        *self.fail_on_write.write().await = n;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Store a row exactly as given, bypassing position assignment.
    ///
    /// Used to set up damaged sequences.
    pub async fn seed(&self, table: &str, scope: Scope, key: impl Into<RecordKey>, position: i64) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(MockRow {
                key: key.into(),
                scope,
                position,
            });
    }

    /// Number of rows in a table across all scopes.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Injected("read".to_string()));
        }
        Ok(())
    }

    async fn scoped(&self, spec: &SequenceSpec, scope: &Scope) -> Result<Vec<MockRow>> {
        self.check_read().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&spec.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| scope.contains(&row.scope))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Run `apply` against a working copy of `spec.table` and commit it only
    /// on success.
    async fn atomic<T, F>(&self, spec: &SequenceSpec, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Unit<'_>) -> Result<T> + Send,
        T: Send,
    {
        let fail_on = *self.fail_on_write.read().await;
        let mut tables = self.tables.write().await;
        let mut unit = Unit {
            table: &spec.table,
            rows: tables.get(&spec.table).cloned().unwrap_or_default(),
            statements: 0,
            fail_on,
        };
        let value = apply(&mut unit)?;
        tables.insert(spec.table.clone(), unit.rows);
        Ok(value)
    }
}

#[async_trait]
impl SequenceStore for MockSequenceStore {
    async fn max_position(&self, spec: &SequenceSpec, scope: &Scope) -> Result<Option<i64>> {
        let rows = self.scoped(spec, scope).await?;
        Ok(rows.iter().map(|row| row.position).max())
    }

    async fn count(&self, spec: &SequenceSpec, scope: &Scope) -> Result<u64> {
        Ok(self.scoped(spec, scope).await?.len() as u64)
    }

    async fn position_of(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
    ) -> Result<Option<i64>> {
        let rows = self.scoped(spec, scope).await?;
        Ok(rows
            .iter()
            .find(|row| row.key == *key)
            .map(|row| row.position))
    }

    async fn entries(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        order: Option<PositionOrder>,
    ) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .scoped(spec, scope)
            .await?
            .into_iter()
            .map(|row| Entry {
                key: row.key,
                position: row.position,
            })
            .collect();
        // Ties break on key, matching the SQL backends.
        match order {
            Some(PositionOrder::Ascending) => {
                entries.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.key.cmp(&b.key)))
            }
            Some(PositionOrder::Descending) => {
                entries.sort_by(|a, b| b.position.cmp(&a.position).then_with(|| a.key.cmp(&b.key)))
            }
            None => {}
        }
        Ok(entries)
    }

    async fn insert(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        position: Option<i64>,
    ) -> Result<i64> {
        self.atomic(spec, |unit| {
            if unit.rows.iter().any(|row| row.key == *key) {
                return Err(StorageError::DuplicateKey {
                    table: unit.table.to_string(),
                    key: key.clone(),
                });
            }
            let position = match position {
                Some(position) => position,
                None => {
                    let max = unit
                        .rows
                        .iter()
                        .filter(|row| scope.contains(&row.scope))
                        .map(|row| row.position)
                        .max();
                    next_position(max, spec.initial_position)
                }
            };
            unit.statement()?;
            unit.rows.push(MockRow {
                key: key.clone(),
                scope: scope.clone(),
                position,
            });
            Ok(position)
        })
        .await
    }

    async fn shift(&self, spec: &SequenceSpec, scope: &Scope, shift: &Shift) -> Result<u64> {
        self.atomic(spec, |unit| unit.shift(scope, shift)).await
    }

    async fn commit_move(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        from: i64,
        to: i64,
    ) -> Result<()> {
        self.atomic(spec, |unit| {
            if let Some(shift) = ShiftPlan::for_move(from, to).shift(Some(key.clone())) {
                unit.shift(scope, &shift)?;
            }
            unit.set_position(scope, key, to)
        })
        .await
    }

    async fn remove(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        position: i64,
    ) -> Result<()> {
        self.atomic(spec, |unit| {
            unit.delete(scope, key)?;
            unit.shift(scope, &shift_after_delete(position))?;
            Ok(())
        })
        .await
    }

    async fn commit_swap(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        a: (&RecordKey, i64),
        b: (&RecordKey, i64),
    ) -> Result<()> {
        self.atomic(spec, |unit| {
            unit.set_position(scope, a.0, b.1)?;
            unit.set_position(scope, b.0, a.1)
        })
        .await
    }

    async fn renumber(&self, spec: &SequenceSpec, scope: &Scope, keys: &[RecordKey]) -> Result<()> {
        self.atomic(spec, |unit| {
            for (i, key) in keys.iter().enumerate() {
                unit.set_position(scope, key, spec.initial_position + i as i64)?;
            }
            Ok(())
        })
        .await
    }
}
