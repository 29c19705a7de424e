//! Sequence storage interface.

use async_trait::async_trait;

use super::record::{Entry, RecordKey, Scope};
use crate::config::SequenceSpec;
use crate::position::PositionOrder;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: table={table}, key={key}")]
    RecordNotFound { table: String, key: RecordKey },

    #[error("Duplicate record: table={table}, key={key}")]
    DuplicateKey { table: String, key: RecordKey },

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Query build error: {0}")]
    Query(#[from] sea_query::error::Error),

    #[error("Injected failure: {0}")]
    Injected(String),

    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),
}

/// Range of positions a shift applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionRange {
    /// `from <= position <= to`
    Between(i64, i64),
    /// `position > after`
    After(i64),
}

impl PositionRange {
    pub fn contains(&self, position: i64) -> bool {
        match *self {
            PositionRange::Between(from, to) => from <= position && position <= to,
            PositionRange::After(after) => position > after,
        }
    }
}

/// Direction of a one-step shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// `position + 1`
    Increment,
    /// `position - 1`
    Decrement,
}

impl ShiftDirection {
    pub fn delta(self) -> i64 {
        match self {
            ShiftDirection::Increment => 1,
            ShiftDirection::Decrement => -1,
        }
    }
}

/// A bulk one-step update over a contiguous range of sibling rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub range: PositionRange,
    pub direction: ShiftDirection,
    /// Row left untouched even when it falls inside the range.
    pub exclude: Option<RecordKey>,
}

impl Shift {
    pub fn new(range: PositionRange, direction: ShiftDirection) -> Self {
        Self {
            range,
            direction,
            exclude: None,
        }
    }

    pub fn excluding(mut self, key: RecordKey) -> Self {
        self.exclude = Some(key);
        self
    }

    /// Whether the row `(key, position)` is touched by this shift.
    pub fn applies_to(&self, key: &RecordKey, position: i64) -> bool {
        self.range.contains(position) && self.exclude.as_ref() != Some(key)
    }
}

/// Interface for position persistence.
///
/// Every method addresses one sequence: the rows of `spec.table` inside
/// `scope`. Methods documented as atomic run in a single transaction; if
/// any statement fails the whole unit is rolled back and the error is
/// returned unchanged.
///
/// # Implementations
///
/// - `SqlSequenceStore<Sqlite>` / `SqlSequenceStore<Postgres>`: SQL storage
/// - `MockSequenceStore`: In-memory mock for testing
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Highest position present in the sequence, `None` when it is empty.
    async fn max_position(&self, spec: &SequenceSpec, scope: &Scope) -> Result<Option<i64>>;

    /// Number of rows in the sequence.
    async fn count(&self, spec: &SequenceSpec, scope: &Scope) -> Result<u64>;

    /// Stored position of a single row.
    async fn position_of(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
    ) -> Result<Option<i64>>;

    /// All rows of the sequence, sorted by position when `order` is given.
    ///
    /// With `order = None` the row order is whatever the store returns.
    async fn entries(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        order: Option<PositionOrder>,
    ) -> Result<Vec<Entry>>;

    /// Insert a row into the sequence (atomic).
    ///
    /// Writes the key, scope columns and position. A `None` position is
    /// resolved to the next free slot inside the same transaction. Returns
    /// the stored position.
    async fn insert(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        position: Option<i64>,
    ) -> Result<i64>;

    /// Apply a single bulk range update. Returns the number of rows touched.
    async fn shift(&self, spec: &SequenceSpec, scope: &Scope, shift: &Shift) -> Result<u64>;

    /// Shift the siblings for a move from `from` to `to`, then write `to` on
    /// the record (atomic).
    async fn commit_move(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        from: i64,
        to: i64,
    ) -> Result<()>;

    /// Delete the row at `position` and close the gap it leaves (atomic).
    async fn remove(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        key: &RecordKey,
        position: i64,
    ) -> Result<()>;

    /// Exchange the positions of two rows without touching any other row
    /// (atomic). Each pair is `(key, current position)`.
    async fn commit_swap(
        &self,
        spec: &SequenceSpec,
        scope: &Scope,
        a: (&RecordKey, i64),
        b: (&RecordKey, i64),
    ) -> Result<()>;

    /// Write `spec.initial_position + i` on the i-th key (atomic).
    async fn renumber(&self, spec: &SequenceSpec, scope: &Scope, keys: &[RecordKey]) -> Result<()>;
}
