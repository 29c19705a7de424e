//! Position maintenance.
//!
//! [`PositionMaintainer`] keeps the position column of a sequence a
//! contiguous, unique run starting at `SequenceSpec::initial_position` as
//! records are created, moved, swapped and deleted.
//!
//! Hosts call it at the points their persistence layer would otherwise fire
//! lifecycle hooks:
//!
//! - before inserting a record: [`PositionMaintainer::before_insert`] (or
//!   [`PositionMaintainer::create`] to insert through the store)
//! - before persisting a changed position: [`PositionMaintainer::before_update`]
//!   (or [`PositionMaintainer::move_to`] to move atomically)
//! - after deleting a record: [`PositionMaintainer::after_delete`] (or
//!   [`PositionMaintainer::remove`] to delete atomically)
//!
//! # Concurrency
//!
//! Each store call is one transaction, so a move never leaves siblings
//! shifted without the record written. Nothing locks the sequence between
//! calls: concurrent writers to the same sequence must be serialized by the
//! caller. [`PositionMaintainer::normalize`] repairs a sequence corrupted by
//! unserialized writers.

mod order;
pub mod shift;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SequenceSpec;
use crate::interfaces::{Entry, Positioned, RecordKey, Scope, SequenceStore, StorageError};

pub use order::PositionOrder;
pub use shift::{is_contiguous, next_position, shift_after_delete, ShiftPlan};

/// Result type for position operations.
pub type Result<T> = std::result::Result<T, PositionError>;

/// Errors that can occur while maintaining positions.
#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Record {key} has no position")]
    Unpositioned { key: RecordKey },

    #[error("Position {position} outside sequence range [{min}, {max}]")]
    OutOfRange { position: i64, min: i64, max: i64 },

    #[error("Records belong to different sequences: {left} vs {right}")]
    ScopeMismatch { left: Scope, right: Scope },

    #[error(
        "Arrangement does not match sequence: expected {expected} distinct members, got {actual}"
    )]
    ArrangeMismatch { expected: usize, actual: usize },
}

/// Result of [`PositionMaintainer::move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target equals the current position; nothing was written.
    Unchanged,
    Moved {
        from: i64,
        to: i64,
    },
}

impl MoveOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

fn require_position<R: Positioned>(record: &R) -> Result<i64> {
    record
        .position()
        .ok_or_else(|| PositionError::Unpositioned { key: record.key() })
}

/// Maintains the position column for one sequence type.
pub struct PositionMaintainer {
    store: Arc<dyn SequenceStore>,
    spec: SequenceSpec,
}

impl PositionMaintainer {
    pub fn new(store: Arc<dyn SequenceStore>, spec: SequenceSpec) -> Self {
        Self { store, spec }
    }

    pub fn spec(&self) -> &SequenceSpec {
        &self.spec
    }

    pub fn store(&self) -> &Arc<dyn SequenceStore> {
        &self.store
    }

    /// Position a record appended to `scope` would receive.
    pub async fn next_position(&self, scope: &Scope) -> Result<i64> {
        let max = self.store.max_position(&self.spec, scope).await?;
        Ok(next_position(max, self.spec.initial_position))
    }

    /// Assign the next position to a record about to be inserted, unless it
    /// already carries an explicit one. Returns the record's position.
    ///
    /// The caller persists the record afterwards.
    pub async fn before_insert<R: Positioned>(&self, record: &mut R) -> Result<i64> {
        if let Some(position) = record.position() {
            return Ok(position);
        }
        let position = self.next_position(&record.scope()).await?;
        record.set_position(position);
        Ok(position)
    }

    /// Insert a record through the store, appending it when it has no
    /// explicit position. Assignment and insert share one transaction.
    pub async fn create<R: Positioned>(&self, record: &mut R) -> Result<i64> {
        let key = record.key();
        let position = self
            .store
            .insert(&self.spec, &record.scope(), &key, record.position())
            .await?;
        record.set_position(position);
        debug!(table = %self.spec.table, key = %key, position, "Created positioned record");
        Ok(position)
    }

    /// Shift siblings for a record whose position was changed in memory
    /// from `old_position`. The caller persists the record afterwards.
    pub async fn before_update<R: Positioned>(
        &self,
        record: &R,
        old_position: i64,
    ) -> Result<ShiftPlan> {
        let new_position = require_position(record)?;
        let plan = ShiftPlan::for_move(old_position, new_position);
        if let Some(shift) = plan.shift(Some(record.key())) {
            let rows = self
                .store
                .shift(&self.spec, &record.scope(), &shift)
                .await?;
            debug!(
                table = %self.spec.table,
                from = old_position,
                to = new_position,
                rows,
                "Shifted siblings before update"
            );
        }
        Ok(plan)
    }

    /// Move a record to `new_position`, shifting the records in between.
    ///
    /// Returns [`MoveOutcome::Unchanged`] without touching the store when
    /// the record is already there.
    pub async fn move_to<R: Positioned>(
        &self,
        record: &mut R,
        new_position: i64,
    ) -> Result<MoveOutcome> {
        let current = require_position(record)?;
        if current == new_position {
            return Ok(MoveOutcome::Unchanged);
        }

        let scope = record.scope();
        if self.spec.validate_bounds {
            self.check_bounds(&scope, new_position).await?;
        }

        let key = record.key();
        self.store
            .commit_move(&self.spec, &scope, &key, current, new_position)
            .await?;
        record.set_position(new_position);

        debug!(
            table = %self.spec.table,
            key = %key,
            from = current,
            to = new_position,
            "Moved record"
        );
        Ok(MoveOutcome::Moved {
            from: current,
            to: new_position,
        })
    }

    /// Move a record to the first slot of its sequence.
    pub async fn move_to_start<R: Positioned>(&self, record: &mut R) -> Result<MoveOutcome> {
        self.move_to(record, self.spec.initial_position).await
    }

    /// Move a record to the last slot of its sequence.
    pub async fn move_to_end<R: Positioned>(&self, record: &mut R) -> Result<MoveOutcome> {
        let max = self.store.max_position(&self.spec, &record.scope()).await?;
        let last = max.unwrap_or(self.spec.initial_position);
        self.move_to(record, last).await
    }

    async fn check_bounds(&self, scope: &Scope, position: i64) -> Result<()> {
        let count = self.store.count(&self.spec, scope).await? as i64;
        let min = self.spec.initial_position;
        let max = min + count - 1;
        if position < min || position > max {
            warn!(table = %self.spec.table, position, min, max, "Rejected out-of-range move");
            return Err(PositionError::OutOfRange { position, min, max });
        }
        Ok(())
    }

    /// Close the gap left by a record the caller has already deleted.
    /// Returns the number of siblings shifted.
    pub async fn after_delete<R: Positioned>(&self, record: &R) -> Result<u64> {
        let position = require_position(record)?;
        let rows = self
            .store
            .shift(&self.spec, &record.scope(), &shift_after_delete(position))
            .await?;
        debug!(table = %self.spec.table, position, rows, "Closed gap after delete");
        Ok(rows)
    }

    /// Delete a record and close its gap in one transaction.
    pub async fn remove<R: Positioned>(&self, record: &R) -> Result<()> {
        let position = require_position(record)?;
        let key = record.key();
        self.store
            .remove(&self.spec, &record.scope(), &key, position)
            .await?;
        debug!(table = %self.spec.table, key = %key, position, "Removed record");
        Ok(())
    }

    /// Exchange the positions of two records of the same sequence.
    ///
    /// No other record is touched and no shift is computed. Both writes
    /// commit together or not at all.
    pub async fn swap<A: Positioned, B: Positioned>(&self, a: &mut A, b: &mut B) -> Result<()> {
        let (key_a, key_b) = (a.key(), b.key());
        if key_a == key_b {
            return Ok(());
        }

        let (scope_a, scope_b) = (a.scope(), b.scope());
        if scope_a != scope_b {
            return Err(PositionError::ScopeMismatch {
                left: scope_a,
                right: scope_b,
            });
        }

        let position_a = require_position(a)?;
        let position_b = require_position(b)?;

        self.store
            .commit_swap(
                &self.spec,
                &scope_a,
                (&key_a, position_a),
                (&key_b, position_b),
            )
            .await?;

        a.set_position(position_b);
        b.set_position(position_a);

        debug!(
            table = %self.spec.table,
            a = %key_a,
            b = %key_b,
            "Swapped positions"
        );
        Ok(())
    }

    /// Rewrite a whole sequence in the order of `keys`.
    ///
    /// `keys` must name every member of the sequence exactly once.
    pub async fn arrange(&self, scope: &Scope, keys: &[RecordKey]) -> Result<()> {
        let members: HashSet<RecordKey> = self
            .store
            .entries(&self.spec, scope, None)
            .await?
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        let requested: HashSet<&RecordKey> = keys.iter().collect();

        if requested.len() != keys.len()
            || keys.len() != members.len()
            || !keys.iter().all(|key| members.contains(key))
        {
            return Err(PositionError::ArrangeMismatch {
                expected: members.len(),
                actual: requested.len(),
            });
        }

        self.store.renumber(&self.spec, scope, keys).await?;
        debug!(table = %self.spec.table, scope = %scope, count = keys.len(), "Arranged sequence");
        Ok(())
    }

    /// Restore contiguity of a damaged sequence, keeping its current order.
    ///
    /// Records sharing a position are ordered by key. Returns whether any
    /// position was rewritten.
    pub async fn normalize(&self, scope: &Scope) -> Result<bool> {
        let mut entries = self.store.entries(&self.spec, scope, None).await?;
        let positions: Vec<i64> = entries.iter().map(|entry| entry.position).collect();
        if is_contiguous(&positions, self.spec.initial_position) {
            return Ok(false);
        }

        entries.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.key.cmp(&b.key)));
        let keys: Vec<RecordKey> = entries.into_iter().map(|entry| entry.key).collect();
        self.store.renumber(&self.spec, scope, &keys).await?;

        info!(
            table = %self.spec.table,
            scope = %scope,
            count = keys.len(),
            "Renumbered non-contiguous sequence"
        );
        Ok(true)
    }

    /// All records of a sequence in the given position order.
    pub async fn ordered(&self, scope: &Scope, order: PositionOrder) -> Result<Vec<Entry>> {
        Ok(self.store.entries(&self.spec, scope, Some(order)).await?)
    }

    /// All records of a sequence, ordered by position only when the sequence
    /// sets `always_order_by_position`.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Entry>> {
        Ok(self
            .store
            .entries(&self.spec, scope, PositionOrder::for_spec(&self.spec))
            .await?)
    }
}
