//! Per-sequence configuration.

use serde::Deserialize;

/// Default table name.
pub const DEFAULT_TABLE: &str = "items";
/// Default primary key column.
pub const DEFAULT_KEY_COLUMN: &str = "id";
/// Default position column.
pub const DEFAULT_POSITION_COLUMN: &str = "position";

/// How one kind of record is ordered.
///
/// Names the table and columns the store addresses, the value the first
/// record of a sequence receives, and the default ordering policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SequenceSpec {
    /// Table holding the rows.
    pub table: String,
    /// Primary key column.
    pub key_column: String,
    /// Integer column holding the position.
    pub position_column: String,
    /// Position of the first record in every sequence.
    pub initial_position: i64,
    /// Apply ascending position order to every listing of this sequence.
    pub always_order_by_position: bool,
    /// Reject moves whose target lies outside the occupied range.
    /// When false, an out-of-range target is written as-is and breaks
    /// contiguity.
    pub validate_bounds: bool,
}

impl Default for SequenceSpec {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            position_column: DEFAULT_POSITION_COLUMN.to_string(),
            initial_position: 0,
            always_order_by_position: false,
            validate_bounds: true,
        }
    }
}

impl SequenceSpec {
    /// Spec for `table` with every other setting defaulted.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn with_position_column(mut self, column: impl Into<String>) -> Self {
        self.position_column = column.into();
        self
    }

    pub fn with_initial_position(mut self, initial: i64) -> Self {
        self.initial_position = initial;
        self
    }

    pub fn with_always_order_by_position(mut self, enabled: bool) -> Self {
        self.always_order_by_position = enabled;
        self
    }

    pub fn with_validate_bounds(mut self, enabled: bool) -> Self {
        self.validate_bounds = enabled;
        self
    }
}
